//! Per-bucket debouncing
//!
//! Collapses a burst of change notifications for one bucket into a single
//! delayed refresh. The shared table is the only arbitration point: each
//! accepted event tries to move the bucket's eligibility marker to
//! `timestamp + window`, conditional on the marker being absent or already
//! in the past relative to the event. Only the winner enqueues a trigger.

use crate::filter::{RecordFilter, Screening};
use crate::notification::{ChangeEvent, NotificationBatch};
use refresh_core::{
    BucketId, DebounceWindow, DelayQueue, Field, FieldValue, KeyValueStore, QueueError,
    RefreshTrigger, StoreError, TimestampMs, WriteCondition, WriteResult,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why a record was not considered for debouncing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InternalActor(String),
    MissingChange,
    Malformed(String),
}

/// Dependency failure that abandoned a record
#[derive(Debug, Error)]
pub enum DebounceFailure {
    #[error("conditional update for bucket {bucket} failed: {source}")]
    Table {
        bucket: BucketId,
        #[source]
        source: StoreError,
    },

    #[error("enqueueing refresh for bucket {bucket} failed: {source}")]
    Queue {
        bucket: BucketId,
        #[source]
        source: QueueError,
    },
}

/// Disposition of one record
#[derive(Debug)]
pub enum RecordOutcome {
    /// Won the window; a trigger is on the delay queue
    Triggered(RefreshTrigger),
    /// Another event already holds the window (expected contention)
    Suppressed { bucket: BucketId, timestamp: TimestampMs },
    /// Filtered out before touching the table
    Skipped(SkipReason),
    /// Abandoned after a table or queue error
    Failed(DebounceFailure),
}

/// Per-batch tally
#[derive(Debug, Default)]
pub struct DebounceReport {
    /// The batch itself was malformed and nothing was processed
    pub rejected: bool,
    pub triggers: Vec<RefreshTrigger>,
    pub suppressed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DebounceReport {
    fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Triggered(trigger) => self.triggers.push(trigger),
            RecordOutcome::Suppressed { .. } => self.suppressed += 1,
            RecordOutcome::Skipped(_) => self.skipped += 1,
            RecordOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Records that reached a final disposition
    pub fn processed(&self) -> usize {
        self.triggers.len() + self.suppressed + self.skipped + self.failed
    }
}

/// Event debouncer
///
/// Stateless apart from its injected dependencies; any number of instances
/// may run against the same table concurrently.
pub struct EventDebouncer {
    table: Arc<dyn KeyValueStore>,
    queue: Arc<dyn DelayQueue>,
    window: DebounceWindow,
    filter: RecordFilter,
}

impl EventDebouncer {
    pub fn new(
        table: Arc<dyn KeyValueStore>,
        queue: Arc<dyn DelayQueue>,
        window: DebounceWindow,
        filter: RecordFilter,
    ) -> Self {
        Self {
            table,
            queue,
            window,
            filter,
        }
    }

    /// Process a notification batch
    ///
    /// Never fails: a malformed batch is rejected as a whole, and every
    /// record after that is isolated from its siblings.
    pub async fn process(&self, batch: &Value) -> DebounceReport {
        let mut report = DebounceReport::default();

        let batch = match NotificationBatch::from_value(batch) {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Ignoring notification batch with unexpected format: {}", e);
                report.rejected = true;
                return report;
            }
        };

        debug!("Processing {} notification records", batch.len());
        for raw in batch.records() {
            let outcome = self.process_record(raw).await;
            report.record(outcome);
        }

        info!(
            triggered = report.triggers.len(),
            suppressed = report.suppressed,
            skipped = report.skipped,
            failed = report.failed,
            "Notification batch processed"
        );
        report
    }

    /// Screen and debounce a single raw record
    pub async fn process_record(&self, raw: &Value) -> RecordOutcome {
        match self.filter.screen(raw) {
            Screening::Accept(event) => self.accept(&event).await,
            Screening::InternalActor(principal) => {
                debug!(principal = %principal, "Ignoring gateway-originated change");
                RecordOutcome::Skipped(SkipReason::InternalActor(principal))
            }
            Screening::MissingChange => {
                debug!("Ignoring record without storage change section");
                RecordOutcome::Skipped(SkipReason::MissingChange)
            }
            Screening::Malformed(reason) => {
                warn!("Ignoring malformed notification record: {}", reason);
                RecordOutcome::Skipped(SkipReason::Malformed(reason))
            }
        }
    }

    /// Run the conditional update for an accepted event; enqueue on a win
    pub async fn accept(&self, event: &ChangeEvent) -> RecordOutcome {
        let outcome = match self.reserve_window(event).await {
            Ok(WriteResult::Applied) => self.schedule(event).await,
            Ok(WriteResult::ConditionFailed) => Ok(RecordOutcome::Suppressed {
                bucket: event.bucket.clone(),
                timestamp: event.timestamp,
            }),
            Err(source) => Err(DebounceFailure::Table {
                bucket: event.bucket.clone(),
                source,
            }),
        };

        match outcome {
            Ok(RecordOutcome::Suppressed { bucket, timestamp }) => {
                debug!(
                    bucket = %bucket,
                    timestamp,
                    "Refresh already scheduled within window, skipping"
                );
                RecordOutcome::Suppressed { bucket, timestamp }
            }
            Ok(outcome) => outcome,
            Err(failure) => {
                error!(bucket = %event.bucket, timestamp = event.timestamp, "{}", failure);
                RecordOutcome::Failed(failure)
            }
        }
    }

    /// Move the eligibility marker to `timestamp + window` iff the stored
    /// marker is absent or strictly earlier than this event
    ///
    /// The stored marker is the previous winner's time plus the window, so a
    /// failed condition means either the window is still open or this event
    /// is older than one already accepted.
    async fn reserve_window(&self, event: &ChangeEvent) -> Result<WriteResult, StoreError> {
        self.table
            .set_field(
                &event.bucket,
                Field::NextEligibleAt,
                FieldValue::Number(self.window.eligible_after(event.timestamp)),
                WriteCondition::AbsentOrBelow(event.timestamp),
            )
            .await
    }

    async fn schedule(&self, event: &ChangeEvent) -> Result<RecordOutcome, DebounceFailure> {
        let trigger = RefreshTrigger::new(event.bucket.clone(), event.timestamp);
        self.queue
            .send(&trigger, self.window.as_duration())
            .await
            .map_err(|source| DebounceFailure::Queue {
                bucket: event.bucket.clone(),
                source,
            })?;

        info!(
            bucket = %trigger.bucket,
            timestamp = trigger.timestamp,
            delay_secs = self.window.as_secs(),
            "Refresh scheduled"
        );
        Ok(RecordOutcome::Triggered(trigger))
    }
}
