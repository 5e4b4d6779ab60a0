//! Core model and storage seams for sgw-refresh
//!
//! This crate provides the shared layer both batch handlers build on:
//! - Debounce record, refresh trigger and share handle types
//! - Event timestamp parsing (milliseconds end-to-end)
//! - `KeyValueStore` with field-level conditional writes (memory + sled)
//! - `DelayQueue` and a sled-backed spool implementation
//! - `ShareGateway` interface for the file-share gateway

pub mod error;
pub mod gateway;
pub mod model;
pub mod queue;
pub mod store;
pub mod time;

// Re-export main types for convenience
pub use error::{GatewayError, QueueError, StoreError, TimestampError};
pub use gateway::{FileShareDetail, FileShareInfo, ShareGateway, ShareProtocol};
pub use model::{
    BucketId, DebounceRecord, DebounceWindow, Field, FieldValue, RefreshTrigger, ShareHandle,
    TimestampMs,
};
pub use queue::{DelayQueue, QueuedTrigger, SpoolQueue};
pub use store::{KeyValueStore, MemoryTable, SledTable, WriteCondition, WriteResult};
