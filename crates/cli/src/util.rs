//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use refresh_core::time::{format_ms, now_ms};
use refresh_core::TimestampMs;
use serde_json::Value;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Read one JSON document from `input`, or stdin when absent
pub async fn read_json_input(input: Option<&Path>) -> Result<Value> {
    let raw = match input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read stdin")?;
            raw
        }
    };

    serde_json::from_str(&raw).context("Input is not valid JSON")
}

/// Format a millisecond timestamp relative to now ("in 42s", "3m ago")
pub fn format_relative_ms(ts: TimestampMs) -> String {
    let delta = ts.saturating_sub(now_ms());
    let secs = (delta / 1000).unsigned_abs();

    let amount = if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86400)
    };

    if delta >= 0 {
        format!("in {}", amount)
    } else {
        format!("{} ago", amount)
    }
}

/// Absolute and relative rendering of a timestamp
pub fn format_timestamp(ts: TimestampMs) -> String {
    format!("{} ({})", format_ms(ts), format_relative_ms(ts))
}

/// "1 share" / "2 shares"
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else if noun.ends_with("ch") || noun.ends_with('s') {
        format!("{} {}es", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
