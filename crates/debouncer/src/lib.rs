//! Change notification debouncing for sgw-refresh
//!
//! This crate provides the event-intake half of the system:
//! - Notification batch/record wire model
//! - Internal-actor and payload screening
//! - Per-bucket debouncing via a conditional write on the shared table
//! - Delayed refresh trigger emission

pub mod debounce;
pub mod filter;
pub mod notification;

pub use debounce::{DebounceFailure, DebounceReport, EventDebouncer, RecordOutcome, SkipReason};
pub use filter::{FilterConfig, RecordFilter, Screening};
pub use notification::{ChangeEvent, MalformedBatch, NotificationBatch, NotificationRecord};
