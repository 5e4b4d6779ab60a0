//! Dispatch one released trigger batch

use crate::util;
use anyhow::Result;
use cli_lib::{Services, SystemConfig};
use dispatcher::DispatchReport;
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(config: &SystemConfig, input: Option<&Path>) -> Result<()> {
    let batch = util::read_json_input(input).await?;

    let services = Services::open(config)?;
    let dispatcher = services.dispatcher()?;
    let report = dispatcher.process(&batch).await;

    print_report(&report);
    Ok(())
}

pub fn print_report(report: &DispatchReport) {
    if report.rejected {
        println!("{} Batch rejected: no Records list", "✗".yellow());
        return;
    }

    println!(
        "{} Refreshed {}",
        "✓".green(),
        util::plural(report.refreshed, "share")
    );
    if report.invalidated > 0 {
        println!(
            "  {} {} failed, cached handle cleared",
            "!".yellow(),
            util::plural(report.invalidated, "refresh")
        );
    }
    println!(
        "  {}",
        format!(
            "unresolved {}, skipped {}, failed {}",
            report.unresolved, report.skipped, report.failed
        )
        .dimmed()
    );
}
