//! Refresh dispatch for released triggers

use crate::resolver::{HandleResolver, ResolveError, Resolution};
use crate::trigger::{DueTrigger, InvalidTrigger, TriggerBatch};
use refresh_core::{BucketId, GatewayError, KeyValueStore, ShareGateway, ShareHandle};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Disposition of one trigger
#[derive(Debug)]
pub enum TriggerOutcome {
    /// Refresh call succeeded
    Refreshed {
        bucket: BucketId,
        share: ShareHandle,
        from_cache: bool,
    },
    /// No share fronts the bucket; nothing to refresh
    Unresolved { bucket: BucketId },
    /// Refresh failed; the cached handle was dropped so the next trigger
    /// resolves from the inventory
    Invalidated {
        bucket: BucketId,
        share: ShareHandle,
        error: GatewayError,
    },
    /// Message lacked the expected attributes
    Skipped(InvalidTrigger),
    /// Handle resolution hit a dependency failure
    Failed { bucket: BucketId, error: ResolveError },
}

/// Per-batch tally
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// The batch itself was malformed and nothing was processed
    pub rejected: bool,
    pub refreshed: usize,
    pub unresolved: usize,
    pub invalidated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DispatchReport {
    pub fn record(&mut self, outcome: &TriggerOutcome) {
        match outcome {
            TriggerOutcome::Refreshed { .. } => self.refreshed += 1,
            TriggerOutcome::Unresolved { .. } => self.unresolved += 1,
            TriggerOutcome::Invalidated { .. } => self.invalidated += 1,
            TriggerOutcome::Skipped(_) => self.skipped += 1,
            TriggerOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.refreshed + self.unresolved + self.invalidated + self.skipped + self.failed
    }
}

/// Refresh dispatcher
pub struct RefreshDispatcher {
    resolver: HandleResolver,
    gateway: Arc<dyn ShareGateway>,
}

impl RefreshDispatcher {
    pub fn new(table: Arc<dyn KeyValueStore>, gateway: Arc<dyn ShareGateway>) -> Self {
        Self {
            resolver: HandleResolver::new(table, Arc::clone(&gateway)),
            gateway,
        }
    }

    /// Process a released trigger batch
    ///
    /// Never fails; each message is isolated from its siblings.
    pub async fn process(&self, batch: &Value) -> DispatchReport {
        let mut report = DispatchReport::default();

        let batch = match TriggerBatch::from_value(batch) {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Ignoring trigger batch with unexpected format: {}", e);
                report.rejected = true;
                return report;
            }
        };

        debug!("Processing {} refresh triggers", batch.len());
        for raw in batch.records() {
            let outcome = self.process_message(raw).await;
            report.record(&outcome);
        }

        info!(
            refreshed = report.refreshed,
            unresolved = report.unresolved,
            invalidated = report.invalidated,
            skipped = report.skipped,
            failed = report.failed,
            "Trigger batch processed"
        );
        report
    }

    /// Decode and dispatch one raw message
    pub async fn process_message(&self, raw: &Value) -> TriggerOutcome {
        match DueTrigger::decode(raw) {
            Ok(trigger) => self.dispatch(&trigger).await,
            Err(e) => {
                warn!("Ignoring invalid trigger message: {}", e);
                TriggerOutcome::Skipped(e)
            }
        }
    }

    /// Resolve the bucket's share and refresh it
    pub async fn dispatch(&self, trigger: &DueTrigger) -> TriggerOutcome {
        let bucket = &trigger.bucket;

        let resolution = match self.resolver.resolve(bucket).await {
            Ok(resolution) => resolution,
            Err(e) => {
                error!(bucket = %bucket, "Abandoning trigger: {}", e);
                return TriggerOutcome::Failed {
                    bucket: bucket.clone(),
                    error: e,
                };
            }
        };

        let from_cache = resolution.is_cached();
        let share = match resolution {
            Resolution::Cached(share) | Resolution::Resolved(share) => share,
            Resolution::NotFound => {
                info!(bucket = %bucket, "Could not find file share for bucket, skipping refresh");
                return TriggerOutcome::Unresolved {
                    bucket: bucket.clone(),
                };
            }
        };

        info!(
            bucket = %bucket,
            share = %share,
            event_ts = ?trigger.timestamp,
            message_id = ?trigger.message_id,
            "Refreshing share"
        );
        match self.gateway.refresh_cache(&share).await {
            Ok(()) => TriggerOutcome::Refreshed {
                bucket: bucket.clone(),
                share,
                from_cache,
            },
            Err(error) => {
                error!(bucket = %bucket, share = %share, "Refresh failed: {}", error);
                self.invalidate(bucket).await;
                TriggerOutcome::Invalidated {
                    bucket: bucket.clone(),
                    share,
                    error,
                }
            }
        }
    }

    async fn invalidate(&self, bucket: &BucketId) {
        match self.resolver.invalidate(bucket).await {
            Ok(()) => info!(bucket = %bucket, "Cleared cached share handle"),
            Err(e) => warn!(bucket = %bucket, "Failed to clear cached share handle: {}", e),
        }
    }
}
