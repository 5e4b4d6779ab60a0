//! Storage change notification wire model
//!
//! A batch is `{"Records": [...]}`. Records are decoded one at a time so a
//! single bad record never takes its siblings down with it.

use refresh_core::time::parse_event_time;
use refresh_core::{BucketId, TimestampMs};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Batch-level rejection: nothing in it is processed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedBatch {
    #[error("batch has no `Records` element")]
    MissingRecords,
    #[error("`Records` is not an array")]
    RecordsNotArray,
}

/// Raw records of one notification batch
#[derive(Debug, Clone)]
pub struct NotificationBatch {
    records: Vec<Value>,
}

impl NotificationBatch {
    /// Split a batch into its records without decoding them
    pub fn from_value(batch: &Value) -> Result<Self, MalformedBatch> {
        match batch.get("Records") {
            None => Err(MalformedBatch::MissingRecords),
            Some(Value::Array(records)) => Ok(Self {
                records: records.clone(),
            }),
            Some(_) => Err(MalformedBatch::RecordsNotArray),
        }
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Who performed the change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserIdentity {
    #[serde(rename = "principalId", default)]
    pub principal_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketEntity {
    #[serde(default)]
    pub name: Option<String>,
}

/// The storage-change payload section
#[derive(Debug, Clone, Deserialize)]
pub struct StorageChange {
    #[serde(default)]
    pub bucket: Option<BucketEntity>,
}

/// One decoded notification record; every section is optional on the wire
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRecord {
    #[serde(rename = "eventTime", default)]
    pub event_time: Option<String>,
    #[serde(rename = "userIdentity", default)]
    pub user_identity: Option<UserIdentity>,
    #[serde(default)]
    pub s3: Option<StorageChange>,
}

impl NotificationRecord {
    pub fn decode(raw: &Value) -> Result<Self, serde_json::Error> {
        NotificationRecord::deserialize(raw)
    }

    pub fn principal_id(&self) -> Option<&str> {
        self.user_identity
            .as_ref()
            .and_then(|identity| identity.principal_id.as_deref())
    }
}

/// Bucket and time extracted from an accepted record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub bucket: BucketId,
    pub timestamp: TimestampMs,
}

/// Why a record with a storage-change section could not be used
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedRecord {
    #[error("record is not a notification object: {0}")]
    Undecodable(String),
    #[error("storage change has no bucket name")]
    MissingBucket,
    #[error("record has no eventTime")]
    MissingEventTime,
    #[error(transparent)]
    BadEventTime(#[from] refresh_core::TimestampError),
}

impl ChangeEvent {
    /// Pull bucket and timestamp out of a record's storage-change section
    pub fn from_change(
        record: &NotificationRecord,
        change: &StorageChange,
    ) -> Result<Self, MalformedRecord> {
        let bucket = change
            .bucket
            .as_ref()
            .and_then(|b| b.name.as_deref())
            .filter(|name| !name.is_empty())
            .ok_or(MalformedRecord::MissingBucket)?;
        let raw_time = record
            .event_time
            .as_deref()
            .ok_or(MalformedRecord::MissingEventTime)?;

        Ok(Self {
            bucket: BucketId::new(bucket),
            timestamp: parse_event_time(raw_time)?,
        })
    }
}
