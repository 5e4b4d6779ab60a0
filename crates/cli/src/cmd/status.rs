//! Show a bucket's debounce record and pending triggers

use crate::util;
use anyhow::{Context, Result};
use cli_lib::{Services, SystemConfig};
use owo_colors::OwoColorize;
use refresh_core::{BucketId, KeyValueStore};

pub async fn run(config: &SystemConfig, bucket: &str) -> Result<()> {
    let bucket = BucketId::new(bucket);
    let services = Services::open(config)?;

    let record = services
        .table()
        .get(&bucket)
        .await
        .context("Failed to read bucket record")?;
    let pending: Vec<_> = services
        .queue()
        .pending()
        .context("Failed to read queue")?
        .into_iter()
        .filter(|queued| queued.trigger.bucket == bucket)
        .collect();

    println!("{}", "Bucket Status".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Bucket:        {}", bucket.as_str().cyan());
    println!("Location:      {}", bucket.location_arn().dimmed());
    println!();

    match record {
        Some(record) => {
            match record.next_eligible_at {
                Some(ts) => println!("Next eligible: {}", util::format_timestamp(ts)),
                None => println!("Next eligible: {}", "never triggered".dimmed()),
            }
            match record.cached_handle.filter(|h| !h.is_empty()) {
                Some(handle) => println!("Cached share:  {}", handle.as_str().green()),
                None => println!("Cached share:  {}", "none".dimmed()),
            }
        }
        None => println!("{}", "No record for this bucket".yellow()),
    }

    println!();
    if pending.is_empty() {
        println!("Pending:       {}", "none".dimmed());
    } else {
        println!("Pending:       {}", util::plural(pending.len(), "trigger"));
        for queued in &pending {
            println!(
                "  {} due {}",
                queued.id.to_string().yellow(),
                util::format_timestamp(queued.visible_at)
            );
        }
    }

    Ok(())
}
