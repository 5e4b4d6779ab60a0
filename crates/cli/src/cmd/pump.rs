//! Dispatch triggers whose delay has elapsed

use crate::cmd::dispatch;
use anyhow::Result;
use cli_lib::{Services, SystemConfig};
use owo_colors::OwoColorize;
use refresh_core::time::now_ms;

pub async fn run(config: &SystemConfig, max: usize) -> Result<()> {
    if max == 0 {
        anyhow::bail!("--max must be at least 1");
    }

    let services = Services::open(config)?;
    let dispatcher = services.dispatcher()?;
    let report = services.pump(&dispatcher, now_ms(), max).await?;

    if report.received == 0 {
        println!("{}", "No triggers due".dimmed());
        return Ok(());
    }

    println!("Received {} due", report.received);
    dispatch::print_report(&report.dispatch);
    Ok(())
}
