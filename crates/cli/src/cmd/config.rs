//! Configuration management command
//!
//! Provides CLI interface to view the effective configuration.

use anyhow::{Context, Result};
use cli_lib::config::{self, MAX_WINDOW_SECS};
use owo_colors::OwoColorize;
use std::path::Path;

/// List all configuration values
pub async fn run_list(explicit: Option<&Path>) -> Result<()> {
    let config = config::load(explicit)?;
    let config_path = config::config_file_path(explicit);

    println!("{}", "System Configuration".bold());
    println!(
        "{}: {}\n",
        "Location".dimmed(),
        config_path.display().dimmed()
    );

    let mut section = "";
    for key in config::KEYS {
        let (prefix, name) = key.split_once('.').unwrap_or(("", *key));
        if prefix != section {
            if !section.is_empty() {
                println!();
            }
            println!("{}", format!("[{}]", prefix).yellow());
            section = prefix;
        }

        let value = config.get(key).unwrap_or_default();
        if *key == "debounce.window_secs" {
            println!(
                "  {} = {} {}",
                name.cyan(),
                value,
                format!("({}s delay per trigger)", value).dimmed()
            );
        } else {
            println!("  {} = {}", name.cyan(), value);
        }
    }

    println!("\n{}", "Valid Ranges:".bold());
    println!("  window_secs: 1-{}", MAX_WINDOW_SECS);
    println!("  level: trace, debug, info, warn, error, off");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(explicit: Option<&Path>, key: &str) -> Result<()> {
    let config = config::load(explicit)?;

    let value = config.get(key).with_context(|| {
        format!(
            "Unknown config key: {}. Use 'sgw-refresh config list' to see available keys.",
            key
        )
    })?;

    println!("{}", value);
    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(explicit: Option<&Path>, create: bool) -> Result<()> {
    let config_path = config::config_file_path(explicit);

    if create && !config_path.exists() {
        config::init_if_missing(&config_path)?;
        println!(
            "{} Created config file at: {}",
            "✓".green(),
            config_path.display()
        );
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!(
            "{}",
            "File does not exist. Use --create to create it.".yellow()
        );
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", config::example_config());
    Ok(())
}
