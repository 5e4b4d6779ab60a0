//! Debounce one change notification batch

use crate::util;
use anyhow::Result;
use cli_lib::{Services, SystemConfig};
use debouncer::DebounceReport;
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(config: &SystemConfig, input: Option<&Path>) -> Result<()> {
    let batch = util::read_json_input(input).await?;

    let services = Services::open(config)?;
    let report = services.debouncer().process(&batch).await;

    print_report(&report);
    Ok(())
}

pub fn print_report(report: &DebounceReport) {
    if report.rejected {
        println!(
            "{} Batch rejected: no Records list",
            "✗".yellow()
        );
        return;
    }

    println!(
        "{} Scheduled {}",
        "✓".green(),
        util::plural(report.triggers.len(), "refresh trigger")
    );
    for trigger in &report.triggers {
        println!("  {} {}", trigger.bucket.as_str().cyan(), trigger.timestamp);
    }
    println!(
        "  {}",
        format!(
            "suppressed {}, skipped {}, failed {}",
            report.suppressed, report.skipped, report.failed
        )
        .dimmed()
    );
}
