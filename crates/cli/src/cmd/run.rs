//! Foreground loop: debounce stdin batches, pump due triggers
//!
//! Each stdin line is one notification batch. Once stdin closes the loop
//! keeps pumping until the spool is empty, then exits.

use crate::util;
use anyhow::{Context, Result};
use cli_lib::{Services, SystemConfig};
use owo_colors::OwoColorize;
use refresh_core::time::now_ms;
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

/// Triggers taken per drain, matching the queue's receive limit
const PUMP_BATCH: usize = 10;

#[derive(Debug, Default)]
struct RunTotals {
    batches: usize,
    scheduled: usize,
    suppressed: usize,
    refreshed: usize,
    invalidated: usize,
    unresolved: usize,
}

pub async fn run(config: &SystemConfig, poll_ms: u64) -> Result<()> {
    if poll_ms == 0 {
        anyhow::bail!("--poll-ms must be at least 1");
    }

    let services = Services::open(config)?;
    let debouncer = services.debouncer();
    let dispatcher = services.dispatcher()?;

    info!(
        window_secs = config.debounce.window_secs,
        poll_ms, "Starting refresh loop"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut totals = RunTotals::default();

    let mut interval = tokio::time::interval(Duration::from_millis(poll_ms));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let line = match line.context("Failed to read stdin")? {
                    Some(line) => line,
                    None => {
                        info!("Input closed, draining pending triggers");
                        stdin_open = false;
                        continue;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                match serde_json::from_str::<Value>(&line) {
                    Ok(batch) => {
                        let report = debouncer.process(&batch).await;
                        totals.batches += 1;
                        totals.scheduled += report.triggers.len();
                        totals.suppressed += report.suppressed;
                    }
                    Err(e) => warn!("Skipping input line that is not JSON: {}", e),
                }
            }
            _ = interval.tick() => {
                match services.pump(&dispatcher, now_ms(), PUMP_BATCH).await {
                    Ok(report) => {
                        totals.refreshed += report.dispatch.refreshed;
                        totals.invalidated += report.dispatch.invalidated;
                        totals.unresolved += report.dispatch.unresolved;
                    }
                    Err(e) => error!("Pump failed: {:#}", e),
                }

                if !stdin_open && services.queue().is_empty() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received interrupt, shutting down");
                break;
            }
        }
    }

    println!(
        "{} Processed {}",
        "✓".green(),
        util::plural(totals.batches, "batch")
    );
    println!("  Scheduled {}", util::plural(totals.scheduled, "refresh trigger"));
    println!("  Refreshed {}", util::plural(totals.refreshed, "share"));
    println!(
        "  {}",
        format!(
            "suppressed {}, unresolved {}, invalidated {}",
            totals.suppressed, totals.unresolved, totals.invalidated
        )
        .dimmed()
    );
    if !services.queue().is_empty() {
        println!(
            "  {} {} still pending",
            "!".yellow(),
            util::plural(services.queue().len(), "trigger")
        );
    }

    Ok(())
}
