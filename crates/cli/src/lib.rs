//! Library half of the `sgw-refresh` binary
//!
//! Configuration, logging setup and local service wiring, shared between
//! the command implementations and the tests.

pub mod config;
pub mod logging;
pub mod services;

pub use config::SystemConfig;
pub use services::{PumpReport, Services};
