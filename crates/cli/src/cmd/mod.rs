//! CLI command implementations

pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod pump;
pub mod run;
pub mod status;
