//! Record screening for the debouncer
//!
//! Applied per record, in order:
//! 1. Internal actor (the gateway's own write-back identity) - skipped so a
//!    refresh never causes another refresh
//! 2. No storage-change section - skipped
//! 3. Storage-change section without a usable bucket or time - skipped

use crate::notification::{ChangeEvent, MalformedRecord, NotificationRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Principal substring identifying the gateway's own writes
pub const DEFAULT_INTERNAL_ACTOR: &str = "StorageGateway";

/// Screening configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Principal substrings whose changes never trigger a refresh
    #[serde(default = "default_internal_actors")]
    pub internal_actor_markers: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            internal_actor_markers: default_internal_actors(),
        }
    }
}

fn default_internal_actors() -> Vec<String> {
    vec![DEFAULT_INTERNAL_ACTOR.to_string()]
}

/// Result of screening one raw record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screening {
    /// Relevant change, proceed to the conditional update
    Accept(ChangeEvent),
    /// Written by an internal actor
    InternalActor(String),
    /// No storage-change section
    MissingChange,
    /// Unusable record
    Malformed(String),
}

/// Compiled screening rules
#[derive(Debug, Clone)]
pub struct RecordFilter {
    config: FilterConfig,
}

impl RecordFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Classify a raw record
    pub fn screen(&self, raw: &Value) -> Screening {
        let record = match NotificationRecord::decode(raw) {
            Ok(record) => record,
            Err(e) => {
                return Screening::Malformed(
                    MalformedRecord::Undecodable(e.to_string()).to_string(),
                )
            }
        };

        if let Some(principal) = record.principal_id() {
            if self.is_internal_actor(principal) {
                return Screening::InternalActor(principal.to_string());
            }
        }

        let change = match record.s3.as_ref() {
            Some(change) => change,
            None => return Screening::MissingChange,
        };

        match ChangeEvent::from_change(&record, change) {
            Ok(event) => Screening::Accept(event),
            Err(e) => Screening::Malformed(e.to_string()),
        }
    }

    /// Check a principal against the configured markers
    pub fn is_internal_actor(&self, principal: &str) -> bool {
        self.config
            .internal_actor_markers
            .iter()
            .any(|marker| !marker.is_empty() && principal.contains(marker.as_str()))
    }
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}
