//! Debounce record and trigger data structures

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Timestamp in milliseconds since the Unix epoch
pub type TimestampMs = i64;

/// Prefix of the location identity a file share declares for its bucket
pub const LOCATION_ARN_PREFIX: &str = "arn:aws:s3:::";

/// Queue message attribute carrying the bucket name
pub const ATTR_BUCKET_NAME: &str = "bucket-name";

/// Queue message attribute carrying the accepted event timestamp
pub const ATTR_TIMESTAMP: &str = "timestamp";

/// Body sent with every trigger message (all data lives in attributes)
pub const EMPTY_BODY: &str = "{}";

/// Storage bucket name, the natural key of a [`DebounceRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketId(String);

impl BucketId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Location identity a file share backed by this bucket declares
    pub fn location_arn(&self) -> String {
        format!("{}{}", LOCATION_ARN_PREFIX, self.0)
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BucketId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Opaque gateway-side identifier of the file share fronting a bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareHandle(String);

impl ShareHandle {
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ShareHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShareHandle {
    fn from(arn: &str) -> Self {
        Self::new(arn)
    }
}

/// Minimum spacing between accepted events for one bucket
///
/// Configured in whole seconds because the delay queue only accepts second
/// granularity; all arithmetic against event timestamps is in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceWindow {
    secs: u64,
}

impl DebounceWindow {
    pub const fn from_secs(secs: u64) -> Self {
        Self { secs }
    }

    pub fn as_secs(&self) -> u64 {
        self.secs
    }

    pub fn as_millis(&self) -> i64 {
        i64::try_from(self.secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }

    /// Delay to request from the queue when enqueueing a trigger
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.secs)
    }

    /// Eligibility marker produced by accepting an event at `timestamp`
    pub fn eligible_after(&self, timestamp: TimestampMs) -> TimestampMs {
        timestamp.saturating_add(self.as_millis())
    }
}

/// Delayed refresh request for one bucket
///
/// `timestamp` is the time of the event that won the debounce race, not the
/// time the trigger was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTrigger {
    pub bucket: BucketId,
    pub timestamp: TimestampMs,
}

impl RefreshTrigger {
    pub fn new(bucket: BucketId, timestamp: TimestampMs) -> Self {
        Self { bucket, timestamp }
    }
}

/// Independently settable fields of a [`DebounceRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Eligibility marker, owned by the debouncer
    NextEligibleAt,
    /// Resolved share handle, owned by the dispatcher
    CachedHandle,
}

impl Field {
    /// Attribute name in the shared table
    pub fn attribute_name(&self) -> &'static str {
        match self {
            Field::NextEligibleAt => "timestamp",
            Field::CachedHandle => "share",
        }
    }
}

/// Typed value of a single record field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Number(i64),
    Text(String),
}

impl FieldValue {
    fn kind(&self) -> &'static str {
        match self {
            FieldValue::Number(_) => "number",
            FieldValue::Text(_) => "string",
        }
    }
}

/// Per-bucket row of the shared table
///
/// Sparse: both fields may be absent in any combination. Rows are upserted
/// by the first field write and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceRecord {
    pub bucket_id: BucketId,
    pub next_eligible_at: Option<TimestampMs>,
    pub cached_handle: Option<ShareHandle>,
}

impl DebounceRecord {
    /// Row with no fields set
    pub fn empty(bucket_id: BucketId) -> Self {
        Self {
            bucket_id,
            next_eligible_at: None,
            cached_handle: None,
        }
    }

    /// Read one field
    pub fn field(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::NextEligibleAt => self.next_eligible_at.map(FieldValue::Number),
            Field::CachedHandle => self
                .cached_handle
                .as_ref()
                .map(|h| FieldValue::Text(h.as_str().to_string())),
        }
    }

    /// Overwrite one field, leaving the other untouched
    pub fn set_field(&mut self, field: Field, value: FieldValue) -> Result<(), StoreError> {
        match (field, value) {
            (Field::NextEligibleAt, FieldValue::Number(n)) => self.next_eligible_at = Some(n),
            (Field::CachedHandle, FieldValue::Text(s)) => {
                self.cached_handle = Some(ShareHandle::new(s))
            }
            (field, other) => {
                return Err(StoreError::TypeMismatch {
                    field,
                    found: other.kind(),
                })
            }
        }
        Ok(())
    }

    /// Remove one field, leaving the other untouched
    pub fn clear_field(&mut self, field: Field) {
        match field {
            Field::NextEligibleAt => self.next_eligible_at = None,
            Field::CachedHandle => self.cached_handle = None,
        }
    }
}
