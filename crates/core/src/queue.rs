//! Delay queue seam and the sled-backed spool used for local runs
//!
//! A trigger sent with a delay becomes receivable once the delay elapses.
//! Spool keys are `visible_at (u64 BE) ++ ulid`, so a range scan up to
//! "now" yields exactly the due messages in release order.

use crate::error::QueueError;
use crate::model::{RefreshTrigger, TimestampMs};
use crate::time::now_ms;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use ulid::Ulid;

const SPOOL_TREE: &str = "delayed_triggers";
const KEY_LEN: usize = 8 + 16;

/// Queue that releases each message after a per-message delay
#[async_trait]
pub trait DelayQueue: Send + Sync {
    /// Enqueue `trigger`, deliverable once `delay` has elapsed
    async fn send(&self, trigger: &RefreshTrigger, delay: Duration) -> Result<(), QueueError>;
}

/// A trigger waiting in (or released from) the spool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedTrigger {
    pub id: Ulid,
    pub visible_at: TimestampMs,
    pub trigger: RefreshTrigger,
}

impl QueuedTrigger {
    fn key(&self) -> [u8; KEY_LEN] {
        spool_key(self.visible_at, self.id)
    }
}

fn spool_key(visible_at: TimestampMs, id: Ulid) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    key[..8].copy_from_slice(&(visible_at.max(0) as u64).to_be_bytes());
    key[8..].copy_from_slice(&id.to_bytes());
    key
}

/// Local delay queue persisted in sled
pub struct SpoolQueue {
    db: sled::Db,
    spool: sled::Tree,
}

impl SpoolQueue {
    /// Open or create a spool at the given directory
    pub fn open(path: &Path) -> Result<Self, QueueError> {
        let db = sled::open(path)?;
        let spool = db.open_tree(SPOOL_TREE)?;
        Ok(Self { db, spool })
    }

    /// Enqueue with an explicit visibility time
    pub fn enqueue_at(
        &self,
        trigger: &RefreshTrigger,
        visible_at: TimestampMs,
    ) -> Result<QueuedTrigger, QueueError> {
        let queued = QueuedTrigger {
            id: Ulid::new(),
            visible_at,
            trigger: trigger.clone(),
        };
        self.spool.insert(queued.key(), bincode::serialize(&queued)?)?;
        self.db.flush()?;
        Ok(queued)
    }

    /// Up to `max` messages whose visibility time is at or before `now`
    ///
    /// Messages stay in the spool until [`SpoolQueue::delete`]; a consumer
    /// that crashes mid-batch sees them again on the next receive.
    pub fn receive_due(
        &self,
        now: TimestampMs,
        max: usize,
    ) -> Result<Vec<QueuedTrigger>, QueueError> {
        let upper = spool_key(now.saturating_add(1), Ulid::nil());
        let mut due = Vec::new();

        for item in self.spool.range(..upper).take(max) {
            let (key, value) = item?;
            if key.len() != KEY_LEN {
                return Err(QueueError::CorruptKey(key.len()));
            }
            due.push(bincode::deserialize(&value)?);
        }

        Ok(due)
    }

    /// Acknowledge a received message
    pub fn delete(&self, queued: &QueuedTrigger) -> Result<(), QueueError> {
        self.spool.remove(queued.key())?;
        self.db.flush()?;
        Ok(())
    }

    /// Every spooled message, due or not
    pub fn pending(&self) -> Result<Vec<QueuedTrigger>, QueueError> {
        let mut out = Vec::new();
        for item in self.spool.iter() {
            let (_, value) = item?;
            out.push(bincode::deserialize(&value)?);
        }
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.spool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spool.is_empty()
    }
}

#[async_trait]
impl DelayQueue for SpoolQueue {
    async fn send(&self, trigger: &RefreshTrigger, delay: Duration) -> Result<(), QueueError> {
        let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
        self.enqueue_at(trigger, now_ms().saturating_add(delay_ms))?;
        Ok(())
    }
}
