//! Config subcommands and layering

use crate::common::TestEnv;
use crate::sgw;
use anyhow::Result;
use std::fs;

#[test]
fn test_config_get_reads_file() -> Result<()> {
    let env = TestEnv::new(7)?;

    let result = sgw!(
        env.dir(),
        "--config",
        env.config_arg(),
        "config",
        "get",
        "debounce.window_secs"
    )
    .assert_success()?;
    assert_eq!(result.first_line(), "7");

    let result = sgw!(env.dir(), "--config", env.config_arg(), "config", "get", "log.level")
        .assert_success()?;
    assert_eq!(result.first_line(), "warn");

    Ok(())
}

#[test]
fn test_env_overrides_file() -> Result<()> {
    let env = TestEnv::new(7)?;

    let result = sgw!(
        env.dir(),
        "--config",
        env.config_arg(),
        "config",
        "get",
        "debounce.window_secs"
    )
    .env("REFRESH_DELAY_SECONDS", "30")
    .assert_success()?;
    assert_eq!(result.first_line(), "30");

    let result = sgw!(env.dir(), "--config", env.config_arg(), "config", "get", "queue.url")
        .env("QUEUE_URL", "file:///tmp/elsewhere")
        .assert_success()?;
    assert_eq!(result.first_line(), "file:///tmp/elsewhere");

    Ok(())
}

#[test]
fn test_config_path_from_env() -> Result<()> {
    let env = TestEnv::new(7)?;

    let result = sgw!(env.dir(), "config", "get", "debounce.window_secs")
        .env("SGW_REFRESH_CONFIG", env.config_arg())
        .assert_success()?;
    assert_eq!(result.first_line(), "7");

    Ok(())
}

#[test]
fn test_unknown_key_fails() -> Result<()> {
    let env = TestEnv::new(7)?;

    let result = sgw!(env.dir(), "--config", env.config_arg(), "config", "get", "daemon.interval")
        .assert_failure()?;
    assert!(result.contains_stderr("Unknown config key"), "{}", result.stderr);

    Ok(())
}

#[test]
fn test_config_list_shows_sections() -> Result<()> {
    let env = TestEnv::new(7)?;

    let result = sgw!(env.dir(), "--config", env.config_arg(), "config", "list").assert_success()?;
    for section in ["[debounce]", "[queue]", "[table]", "[gateway]", "[log]"] {
        assert!(result.contains_stdout(section), "missing {}", section);
    }
    assert!(result.contains_stdout("internal_actor_markers"));

    Ok(())
}

#[test]
fn test_config_path_create() -> Result<()> {
    let env = TestEnv::new(7)?;
    let path = env.dir().join("fresh").join("config.toml");
    let path_arg = path.display().to_string();

    let result = sgw!(env.dir(), "--config", &path_arg, "config", "path").assert_success()?;
    assert!(result.contains_stdout("does not exist"));

    let result = sgw!(env.dir(), "--config", &path_arg, "config", "path", "--create")
        .assert_success()?;
    assert!(result.contains_stdout("Created config file"));
    assert!(path.exists());

    let result = sgw!(env.dir(), "--config", &path_arg, "config", "get", "debounce.window_secs")
        .assert_success()?;
    assert_eq!(result.first_line(), "60");

    Ok(())
}

#[test]
fn test_config_example() -> Result<()> {
    let env = TestEnv::new(7)?;

    let result = sgw!(env.dir(), "config", "example").assert_success()?;
    assert!(result.contains_stdout("[debounce]"));
    assert!(result.contains_stdout("REFRESH_DELAY_SECONDS"));

    Ok(())
}

#[test]
fn test_out_of_range_window_is_rejected() -> Result<()> {
    let env = TestEnv::new(7)?;
    let raw = fs::read_to_string(env.config_path())?;
    fs::write(env.config_path(), raw.replace("window_secs = 7", "window_secs = 0"))?;

    let result = sgw!(env.dir(), "--config", env.config_arg(), "pump").assert_failure()?;
    assert!(result.contains_stderr("window_secs"), "{}", result.stderr);

    let result = sgw!(env.dir(), "--config", env.config_arg(), "pump")
        .env("REFRESH_DELAY_SECONDS", "5")
        .assert_success()?;
    assert!(result.contains_stdout("No triggers due"), "{}", result.stdout);

    Ok(())
}

#[test]
fn test_missing_explicit_config_fails() -> Result<()> {
    let env = TestEnv::new(7)?;
    let missing = env.dir().join("missing.toml");

    sgw!(env.dir(), "--config", missing.to_str().unwrap_or_default(), "pump").assert_failure()?;

    Ok(())
}
