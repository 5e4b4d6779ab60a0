//! Debounce -> delay -> dispatch through the binary

use crate::common::{change_record, notification, Share, TestEnv};
use crate::sgw;
use anyhow::Result;
use serde_json::json;
use std::thread::sleep;
use std::time::Duration;

#[test]
fn test_burst_yields_one_trigger() -> Result<()> {
    let env = TestEnv::new(60)?;
    let batch = json!({"Records": [
        change_record("b1", "2024-01-01T00:00:00Z", "AWS:user"),
        change_record("b1", "2024-01-01T00:00:05Z", "AWS:user"),
    ]});
    let input = env.write_json("batch.json", &batch)?;

    let result = sgw!(env.dir(), "--config", env.config_arg(), "debounce", "--input", &input)
        .assert_success()?;
    assert!(result.contains_stdout("Scheduled 1 refresh trigger"), "{}", result.stdout);
    assert!(result.contains_stdout("suppressed 1"), "{}", result.stdout);

    // Past the window: a new trigger
    let later = env.write_json("later.json", &notification("b1", "2024-01-01T00:01:05Z"))?;
    let result = sgw!(env.dir(), "--config", env.config_arg(), "debounce", "--input", &later)
        .assert_success()?;
    assert!(result.contains_stdout("Scheduled 1 refresh trigger"), "{}", result.stdout);

    let status = sgw!(env.dir(), "--config", env.config_arg(), "status", "b1").assert_success()?;
    assert!(status.contains_stdout("2 triggers"), "{}", status.stdout);
    assert!(status.contains_stdout("2024-01-01T00:02:05.000Z"), "{}", status.stdout);

    Ok(())
}

#[test]
fn test_debounce_reads_stdin() -> Result<()> {
    let env = TestEnv::new(60)?;
    let batch = notification("b1", "2024-01-01T00:00:00Z").to_string();

    let result = sgw!(env.dir(), "--config", env.config_arg(), "debounce")
        .stdin(&batch)
        .assert_success()?;
    assert!(result.contains_stdout("Scheduled 1 refresh trigger"), "{}", result.stdout);

    Ok(())
}

#[test]
fn test_internal_actor_and_bad_records_are_skipped() -> Result<()> {
    let env = TestEnv::new(60)?;
    let batch = json!({"Records": [
        change_record("b1", "2024-01-01T00:00:00Z", "AWS:AROAEXAMPLE:StorageGateway-sgw-1"),
        {"eventTime": "2024-01-01T00:00:00Z"},
        change_record("b2", "2024-01-01T00:00:00Z", "AWS:user"),
    ]});
    let input = env.write_json("batch.json", &batch)?;

    let result = sgw!(env.dir(), "--config", env.config_arg(), "debounce", "--input", &input)
        .assert_success()?;
    assert!(result.contains_stdout("Scheduled 1 refresh trigger"), "{}", result.stdout);
    assert!(result.contains_stdout("skipped 2"), "{}", result.stdout);

    let status = sgw!(env.dir(), "--config", env.config_arg(), "status", "b1").assert_success()?;
    assert!(status.contains_stdout("No record for this bucket"), "{}", status.stdout);

    Ok(())
}

#[test]
fn test_batch_without_records_is_rejected() -> Result<()> {
    let env = TestEnv::new(60)?;
    let input = env.write_json("batch.json", &json!({"events": []}))?;

    let result = sgw!(env.dir(), "--config", env.config_arg(), "debounce", "--input", &input)
        .assert_success()?;
    assert!(result.contains_stdout("Batch rejected"), "{}", result.stdout);

    Ok(())
}

#[test]
fn test_invalid_json_input_fails() -> Result<()> {
    let env = TestEnv::new(60)?;

    let result = sgw!(env.dir(), "--config", env.config_arg(), "debounce")
        .stdin("not json")
        .assert_failure()?;
    assert!(result.contains_stderr("not valid JSON"), "{}", result.stderr);

    Ok(())
}

#[test]
fn test_pump_waits_for_delay() -> Result<()> {
    let env = TestEnv::new(1)?;
    env.write_inventory(&[Share::nfs("share-1", "b1")])?;
    let input = env.write_json("batch.json", &notification("b1", "2024-01-01T00:00:00Z"))?;

    sgw!(env.dir(), "--config", env.config_arg(), "debounce", "--input", &input)
        .assert_success()?;

    let early = sgw!(env.dir(), "--config", env.config_arg(), "pump").assert_success()?;
    assert!(early.contains_stdout("No triggers due"), "{}", early.stdout);

    sleep(Duration::from_millis(1200));

    let due = sgw!(env.dir(), "--config", env.config_arg(), "pump").assert_success()?;
    assert!(due.contains_stdout("Received 1 due"), "{}", due.stdout);
    assert!(due.contains_stdout("Refreshed 1 share"), "{}", due.stdout);

    // Acknowledged
    let again = sgw!(env.dir(), "--config", env.config_arg(), "pump").assert_success()?;
    assert!(again.contains_stdout("No triggers due"), "{}", again.stdout);

    let status = sgw!(env.dir(), "--config", env.config_arg(), "status", "b1").assert_success()?;
    assert!(status.contains_stdout("share-1"), "{}", status.stdout);

    Ok(())
}

#[test]
fn test_run_debounces_stdin_and_drains() -> Result<()> {
    let env = TestEnv::new(1)?;
    env.write_inventory(&[Share::nfs("share-1", "b1")])?;
    let input = format!(
        "{}\n\n{}\n",
        notification("b1", "2024-01-01T00:00:00Z"),
        notification("b1", "2024-01-01T00:00:00.500Z"),
    );

    let result = sgw!(env.dir(), "--config", env.config_arg(), "run", "--poll-ms", "100")
        .stdin(&input)
        .assert_success()?;

    assert!(result.contains_stdout("Processed 2 batches"), "{}", result.stdout);
    assert!(result.contains_stdout("Scheduled 1 refresh trigger"), "{}", result.stdout);
    assert!(result.contains_stdout("Refreshed 1 share"), "{}", result.stdout);
    assert!(result.duration >= Duration::from_millis(900));

    Ok(())
}
