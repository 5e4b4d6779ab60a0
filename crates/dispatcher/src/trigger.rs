//! Released trigger wire model
//!
//! Each message carries its data in attributes:
//! `bucket-name` (String) and `timestamp` (Number, as a string).

use refresh_core::model::{ATTR_BUCKET_NAME, ATTR_TIMESTAMP, EMPTY_BODY};
use refresh_core::{BucketId, RefreshTrigger, TimestampMs};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

/// Batch-level rejection
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedBatch {
    #[error("batch has no `Records` element")]
    MissingRecords,
    #[error("`Records` is not an array")]
    RecordsNotArray,
}

/// Message that cannot be dispatched
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidTrigger {
    #[error("message is not a queue record: {0}")]
    Undecodable(String),
    #[error("message has no messageAttributes")]
    MissingAttributes,
    #[error("message has no `bucket-name` attribute")]
    MissingBucket,
}

/// Raw messages of one released batch
#[derive(Debug, Clone)]
pub struct TriggerBatch {
    records: Vec<Value>,
}

impl TriggerBatch {
    pub fn from_value(batch: &Value) -> Result<Self, MalformedBatch> {
        match batch.get("Records") {
            None => Err(MalformedBatch::MissingRecords),
            Some(Value::Array(records)) => Ok(Self {
                records: records.clone(),
            }),
            Some(_) => Err(MalformedBatch::RecordsNotArray),
        }
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render triggers as the queue would deliver them
    pub fn encode<'a>(triggers: impl IntoIterator<Item = &'a RefreshTrigger>) -> Value {
        let records: Vec<Value> = triggers
            .into_iter()
            .map(|trigger| {
                let mut attributes = Map::new();
                attributes.insert(
                    ATTR_BUCKET_NAME.to_string(),
                    json!({"dataType": "String", "stringValue": trigger.bucket.as_str()}),
                );
                attributes.insert(
                    ATTR_TIMESTAMP.to_string(),
                    json!({"dataType": "Number", "stringValue": trigger.timestamp.to_string()}),
                );
                json!({"messageAttributes": attributes, "body": EMPTY_BODY})
            })
            .collect();
        json!({ "Records": records })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct MessageAttribute {
    #[serde(rename = "stringValue", alias = "StringValue", default)]
    string_value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TriggerMessage {
    #[serde(rename = "messageId", default)]
    message_id: Option<String>,
    #[serde(rename = "messageAttributes", default)]
    message_attributes: Option<HashMap<String, MessageAttribute>>,
}

/// A decoded, dispatchable trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTrigger {
    pub bucket: BucketId,
    /// Winning event time; informational on this side
    pub timestamp: Option<TimestampMs>,
    pub message_id: Option<String>,
}

impl DueTrigger {
    pub fn decode(raw: &Value) -> Result<Self, InvalidTrigger> {
        let message = TriggerMessage::deserialize(raw)
            .map_err(|e| InvalidTrigger::Undecodable(e.to_string()))?;
        let attributes = message
            .message_attributes
            .ok_or(InvalidTrigger::MissingAttributes)?;

        let bucket = attributes
            .get(ATTR_BUCKET_NAME)
            .and_then(|a| a.string_value.as_deref())
            .filter(|name| !name.is_empty())
            .ok_or(InvalidTrigger::MissingBucket)?;

        let timestamp = attributes
            .get(ATTR_TIMESTAMP)
            .and_then(|a| a.string_value.as_deref())
            .and_then(|raw| match parse_timestamp(raw) {
                Some(ts) => Some(ts),
                None => {
                    warn!(bucket, "Ignoring unparsable trigger timestamp {:?}", raw);
                    None
                }
            });

        Ok(Self {
            bucket: BucketId::new(bucket),
            timestamp,
            message_id: message.message_id,
        })
    }
}

/// Number attributes arrive as strings. Integers are milliseconds; older
/// producers sent fractional epoch seconds, which are scaled to milliseconds.
fn parse_timestamp(raw: &str) -> Option<TimestampMs> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|secs| (secs * 1000.0).round() as i64)
    })
}
