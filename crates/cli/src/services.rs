//! Local wiring of the debouncer and dispatcher
//!
//! Both halves share one sled table. Triggers travel through a sled spool
//! that `pump` drains once their delay has elapsed.

use crate::config::SystemConfig;
use anyhow::{Context, Result};
use debouncer::{EventDebouncer, RecordFilter};
use dispatcher::{DispatchReport, InventoryGateway, RefreshDispatcher, TriggerBatch};
use refresh_core::{SledTable, SpoolQueue, TimestampMs};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one spool drain
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PumpReport {
    /// Messages taken off the spool
    pub received: usize,
    pub dispatch: DispatchReport,
}

/// Opened table and spool for one process
pub struct Services {
    config: SystemConfig,
    table: Arc<SledTable>,
    queue: Arc<SpoolQueue>,
}

impl Services {
    pub fn open(config: &SystemConfig) -> Result<Self> {
        let table_path = &config.table.path;
        let table = SledTable::open(table_path)
            .with_context(|| format!("Failed to open table at {}", table_path.display()))?;

        let spool_path = config.queue.spool_path()?;
        let queue = SpoolQueue::open(&spool_path)
            .with_context(|| format!("Failed to open queue at {}", spool_path.display()))?;

        debug!(
            table = %table_path.display(),
            queue = %spool_path.display(),
            "Opened local table and queue"
        );

        Ok(Self {
            config: config.clone(),
            table: Arc::new(table),
            queue: Arc::new(queue),
        })
    }

    pub fn table(&self) -> &SledTable {
        &self.table
    }

    pub fn queue(&self) -> &SpoolQueue {
        &self.queue
    }

    pub fn debouncer(&self) -> EventDebouncer {
        EventDebouncer::new(
            self.table.clone(),
            self.queue.clone(),
            self.config.debounce.window(),
            RecordFilter::new(self.config.debounce.filter()),
        )
    }

    /// Dispatcher against the configured share inventory
    pub fn dispatcher(&self) -> Result<RefreshDispatcher> {
        let path = &self.config.gateway.inventory;
        let gateway = InventoryGateway::load(path)
            .with_context(|| format!("Failed to load share inventory {}", path.display()))?;
        Ok(RefreshDispatcher::new(self.table.clone(), Arc::new(gateway)))
    }

    /// Dispatch up to `max` triggers visible at `now`, then acknowledge them
    ///
    /// Dispatch isolates per-message failures, so every received message is
    /// deleted once its batch has been processed.
    pub async fn pump(
        &self,
        dispatcher: &RefreshDispatcher,
        now: TimestampMs,
        max: usize,
    ) -> Result<PumpReport> {
        let due = self
            .queue
            .receive_due(now, max)
            .context("Failed to receive due triggers")?;
        if due.is_empty() {
            return Ok(PumpReport::default());
        }

        let batch = TriggerBatch::encode(due.iter().map(|queued| &queued.trigger));
        let dispatch = dispatcher.process(&batch).await;

        for queued in &due {
            self.queue
                .delete(queued)
                .with_context(|| format!("Failed to acknowledge trigger {}", queued.id))?;
        }

        info!(received = due.len(), refreshed = dispatch.refreshed, "Drained due triggers");
        Ok(PumpReport {
            received: due.len(),
            dispatch,
        })
    }
}
