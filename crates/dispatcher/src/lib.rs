//! Refresh dispatch for sgw-refresh
//!
//! This crate provides the consumer half of the system:
//! - Released trigger wire model
//! - Bucket -> share handle resolution cached in the shared table
//! - Refresh dispatch with self-healing invalidation
//! - File-backed share inventory gateway for local runs

pub mod dispatch;
pub mod inventory;
pub mod resolver;
pub mod trigger;

// Re-exports
pub use dispatch::{DispatchReport, RefreshDispatcher, TriggerOutcome};
pub use inventory::{InventoryError, InventoryGateway, InventoryShare};
pub use resolver::{HandleResolver, ResolveError, Resolution};
pub use trigger::{DueTrigger, InvalidTrigger, TriggerBatch};
