//! Workflow integration tests
//!
//! Tests for complete workflows that exercise multiple commands
//! and validate end-to-end behavior.

pub mod config_commands;
pub mod debounce_flow;
pub mod self_healing;
