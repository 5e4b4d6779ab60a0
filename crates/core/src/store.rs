//! Shared debounce table: a sparse per-bucket field store
//!
//! Both batch handlers meet here. The debouncer owns the eligibility marker
//! and only ever writes it conditionally; the dispatcher owns the cached
//! share handle. Every write touches exactly one field, so the two actors
//! never clobber each other.

use crate::error::StoreError;
use crate::model::{BucketId, DebounceRecord, Field, FieldValue};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::path::Path;
use tracing::debug;

/// sled tree holding the encoded records
const RECORDS_TREE: &str = "debounce_records";

/// Precondition evaluated atomically with a field write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCondition {
    /// Unconditional upsert
    Always,
    /// Field is absent, or holds a number strictly below the given value
    AbsentOrBelow(i64),
}

impl WriteCondition {
    fn holds(&self, field: Field, current: Option<&FieldValue>) -> Result<bool, StoreError> {
        match (self, current) {
            (WriteCondition::Always, _) => Ok(true),
            (WriteCondition::AbsentOrBelow(_), None) => Ok(true),
            (WriteCondition::AbsentOrBelow(limit), Some(FieldValue::Number(stored))) => {
                Ok(stored < limit)
            }
            (WriteCondition::AbsentOrBelow(_), Some(FieldValue::Text(_))) => {
                Err(StoreError::TypeMismatch {
                    field,
                    found: "string",
                })
            }
        }
    }
}

/// Result of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    /// Condition held and the field was written
    Applied,
    /// Condition was false; nothing was written
    ConditionFailed,
}

/// Key-value table keyed by bucket with field-level conditional writes
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a bucket's record (None if no field was ever written)
    async fn get(&self, bucket: &BucketId) -> Result<Option<DebounceRecord>, StoreError>;

    /// Set one field, creating the record if needed, iff `condition` holds
    async fn set_field(
        &self,
        bucket: &BucketId,
        field: Field,
        value: FieldValue,
        condition: WriteCondition,
    ) -> Result<WriteResult, StoreError>;

    /// Remove one field; a missing record or field is not an error
    async fn remove_field(&self, bucket: &BucketId, field: Field) -> Result<(), StoreError>;
}

/// In-process table
///
/// Conditional writes hold the shard entry for the whole
/// read-evaluate-write, so concurrent callers serialize per bucket.
#[derive(Debug, Default)]
pub struct MemoryTable {
    records: DashMap<BucketId, DebounceRecord>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bucket records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryTable {
    async fn get(&self, bucket: &BucketId) -> Result<Option<DebounceRecord>, StoreError> {
        Ok(self.records.get(bucket).map(|r| r.value().clone()))
    }

    async fn set_field(
        &self,
        bucket: &BucketId,
        field: Field,
        value: FieldValue,
        condition: WriteCondition,
    ) -> Result<WriteResult, StoreError> {
        match self.records.entry(bucket.clone()) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get().field(field);
                if !condition.holds(field, current.as_ref())? {
                    return Ok(WriteResult::ConditionFailed);
                }
                occupied.get_mut().set_field(field, value)?;
            }
            Entry::Vacant(vacant) => {
                if !condition.holds(field, None)? {
                    return Ok(WriteResult::ConditionFailed);
                }
                let mut record = DebounceRecord::empty(bucket.clone());
                record.set_field(field, value)?;
                vacant.insert(record);
            }
        }
        Ok(WriteResult::Applied)
    }

    async fn remove_field(&self, bucket: &BucketId, field: Field) -> Result<(), StoreError> {
        if let Some(mut record) = self.records.get_mut(bucket) {
            record.clear_field(field);
        }
        Ok(())
    }
}

/// sled-backed table for local deployments
///
/// Records are bincode-encoded. Writes go through `compare_and_swap`; when a
/// concurrent writer changes the record between our read and our swap, the
/// condition is re-evaluated against the fresh value.
pub struct SledTable {
    db: sled::Db,
    records: sled::Tree,
}

impl SledTable {
    /// Open or create a table at the given directory
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        let records = db.open_tree(RECORDS_TREE)?;
        Ok(Self { db, records })
    }

    fn decode(
        bucket: &BucketId,
        raw: Option<&sled::IVec>,
    ) -> Result<DebounceRecord, StoreError> {
        match raw {
            Some(bytes) => Ok(bincode::deserialize(bytes)?),
            None => Ok(DebounceRecord::empty(bucket.clone())),
        }
    }

    /// Swap `current` for `next`; Ok(false) means another writer got there first
    fn swap(
        &self,
        bucket: &BucketId,
        current: Option<sled::IVec>,
        next: &DebounceRecord,
    ) -> Result<bool, StoreError> {
        let encoded = bincode::serialize(next)?;
        match self
            .records
            .compare_and_swap(bucket.as_str(), current, Some(encoded))?
        {
            Ok(()) => {
                self.db.flush()?;
                Ok(true)
            }
            Err(_) => {
                debug!(bucket = %bucket, "Lost compare-and-swap race, re-reading record");
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl KeyValueStore for SledTable {
    async fn get(&self, bucket: &BucketId) -> Result<Option<DebounceRecord>, StoreError> {
        match self.records.get(bucket.as_str())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn set_field(
        &self,
        bucket: &BucketId,
        field: Field,
        value: FieldValue,
        condition: WriteCondition,
    ) -> Result<WriteResult, StoreError> {
        loop {
            let current = self.records.get(bucket.as_str())?;
            let mut record = Self::decode(bucket, current.as_ref())?;

            if !condition.holds(field, record.field(field).as_ref())? {
                return Ok(WriteResult::ConditionFailed);
            }

            record.set_field(field, value.clone())?;
            if self.swap(bucket, current, &record)? {
                return Ok(WriteResult::Applied);
            }
        }
    }

    async fn remove_field(&self, bucket: &BucketId, field: Field) -> Result<(), StoreError> {
        loop {
            let current = match self.records.get(bucket.as_str())? {
                Some(bytes) => bytes,
                None => return Ok(()),
            };
            let mut record = Self::decode(bucket, Some(&current))?;
            if record.field(field).is_none() {
                return Ok(());
            }

            record.clear_field(field);
            if self.swap(bucket, Some(current), &record)? {
                return Ok(());
            }
        }
    }
}
