//! Common utilities for integration tests

pub mod cli;
pub mod fixtures;

// Re-export commonly used items
pub use fixtures::{change_record, notification, trigger_batch, Share, TestEnv};
