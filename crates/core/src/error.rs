//! Error types for the storage, queue and gateway seams

use crate::model::{Field, ShareHandle};
use thiserror::Error;

/// Failure talking to the shared debounce table
///
/// A lost conditional write is *not* an error; it is reported as
/// [`crate::WriteResult::ConditionFailed`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table backend error: {0}")]
    Sled(#[from] sled::Error),

    #[error("failed to encode or decode record: {0}")]
    Codec(#[from] bincode::Error),

    #[error("field `{}` cannot hold a {found} value", field.attribute_name())]
    TypeMismatch { field: Field, found: &'static str },

    #[error("table unavailable: {0}")]
    Unavailable(String),
}

/// Failure enqueueing or reading delayed triggers
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue backend error: {0}")]
    Sled(#[from] sled::Error),

    #[error("failed to encode or decode message: {0}")]
    Codec(#[from] bincode::Error),

    #[error("corrupt spool key ({0} bytes)")]
    CorruptKey(usize),

    #[error("send rejected: {0}")]
    Rejected(String),
}

/// Failure returned by the file-share gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway refused the request shape, e.g. a describe call for a
    /// protocol the client API surface does not understand
    #[error("invalid gateway request in {operation}: {message}")]
    InvalidGatewayRequest {
        operation: &'static str,
        message: String,
    },

    #[error("file share {0} not found")]
    ShareNotFound(ShareHandle),

    #[error("gateway {operation} failed: {message}")]
    Request {
        operation: &'static str,
        message: String,
    },
}

/// Event time that could not be turned into epoch milliseconds
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("unrecognised event time {0:?}")]
    Unrecognised(String),

    #[error("event time {0:?} is outside the representable range")]
    OutOfRange(String),
}
