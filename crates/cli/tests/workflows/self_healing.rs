//! Share handle caching and recovery across dispatch runs

use crate::common::{trigger_batch, Share, TestEnv};
use crate::sgw;
use anyhow::Result;
use serde_json::json;

#[test]
fn test_replaced_share_heals_on_next_trigger() -> Result<()> {
    let env = TestEnv::new(60)?;
    env.write_inventory(&[Share::nfs("share-old", "b1")])?;
    let input = env.write_json("triggers.json", &trigger_batch(&["b1"]))?;

    let first = sgw!(env.dir(), "--config", env.config_arg(), "dispatch", "--input", &input)
        .assert_success()?;
    assert!(first.contains_stdout("Refreshed 1 share"), "{}", first.stdout);

    // Share recreated: the cached handle is now stale
    env.write_inventory(&[
        Share::nfs("share-old", "b1").deleted(),
        Share::nfs("share-new", "b1"),
    ])?;

    let stale = sgw!(env.dir(), "--config", env.config_arg(), "dispatch", "--input", &input)
        .assert_success()?;
    assert!(stale.contains_stdout("Refreshed 0 shares"), "{}", stale.stdout);
    assert!(stale.contains_stdout("cached handle cleared"), "{}", stale.stdout);

    let status = sgw!(env.dir(), "--config", env.config_arg(), "status", "b1").assert_success()?;
    assert!(!status.contains_stdout("share-old"), "{}", status.stdout);

    let healed = sgw!(env.dir(), "--config", env.config_arg(), "dispatch", "--input", &input)
        .assert_success()?;
    assert!(healed.contains_stdout("Refreshed 1 share"), "{}", healed.stdout);

    let status = sgw!(env.dir(), "--config", env.config_arg(), "status", "b1").assert_success()?;
    assert!(status.contains_stdout("share-new"), "{}", status.stdout);

    Ok(())
}

#[test]
fn test_unbacked_bucket_is_skipped() -> Result<()> {
    let env = TestEnv::new(60)?;
    env.write_inventory(&[Share::nfs("share-1", "b1")])?;
    let input = env.write_json("triggers.json", &trigger_batch(&["b9", "b1"]))?;

    let result = sgw!(env.dir(), "--config", env.config_arg(), "dispatch", "--input", &input)
        .assert_success()?;
    assert!(result.contains_stdout("Refreshed 1 share"), "{}", result.stdout);
    assert!(result.contains_stdout("unresolved 1"), "{}", result.stdout);

    Ok(())
}

#[test]
fn test_smb_share_resolves() -> Result<()> {
    let env = TestEnv::new(60)?;
    env.write_inventory(&[
        Share::nfs("share-nfs", "other"),
        Share {
            arn: "share-smb",
            share_type: Some("SMB"),
            bucket: "b1",
            deleted: false,
        },
    ])?;
    let input = env.write_json("triggers.json", &trigger_batch(&["b1"]))?;

    sgw!(env.dir(), "--config", env.config_arg(), "dispatch", "--input", &input)
        .assert_success()?;

    let status = sgw!(env.dir(), "--config", env.config_arg(), "status", "b1").assert_success()?;
    assert!(status.contains_stdout("share-smb"), "{}", status.stdout);

    Ok(())
}

#[test]
fn test_message_without_attributes_is_skipped() -> Result<()> {
    let env = TestEnv::new(60)?;
    env.write_inventory(&[Share::nfs("share-1", "b1")])?;
    let mut batch = trigger_batch(&["b1"]);
    if let Some(records) = batch["Records"].as_array_mut() {
        records.insert(0, json!({"body": "{}"}));
    }
    let input = env.write_json("triggers.json", &batch)?;

    let result = sgw!(env.dir(), "--config", env.config_arg(), "dispatch", "--input", &input)
        .assert_success()?;
    assert!(result.contains_stdout("Refreshed 1 share"), "{}", result.stdout);
    assert!(result.contains_stdout("skipped 1"), "{}", result.stdout);

    Ok(())
}

#[test]
fn test_missing_inventory_fails() -> Result<()> {
    let env = TestEnv::new(60)?;
    std::fs::remove_file(env.dir().join("inventory.toml"))?;
    let input = env.write_json("triggers.json", &trigger_batch(&["b1"]))?;

    let result = sgw!(env.dir(), "--config", env.config_arg(), "dispatch", "--input", &input)
        .assert_failure()?;
    assert!(result.contains_stderr("share inventory"), "{}", result.stderr);

    Ok(())
}
