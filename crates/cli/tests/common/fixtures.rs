//! Test environment fixtures
//!
//! Each `TestEnv` owns a temp directory holding a config file, a share
//! inventory, and the table/queue directories the binary creates.

use anyhow::Result;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A share entry for the inventory file
pub struct Share<'a> {
    pub arn: &'a str,
    pub share_type: Option<&'a str>,
    pub bucket: &'a str,
    pub deleted: bool,
}

impl<'a> Share<'a> {
    pub fn nfs(arn: &'a str, bucket: &'a str) -> Self {
        Self {
            arn,
            share_type: None,
            bucket,
            deleted: false,
        }
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }
}

pub struct TestEnv {
    dir: TempDir,
    config_path: PathBuf,
    inventory_path: PathBuf,
}

impl TestEnv {
    /// Environment with the given debounce window and an empty inventory
    pub fn new(window_secs: u64) -> Result<Self> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("config.toml");
        let inventory_path = dir.path().join("inventory.toml");

        let config = format!(
            r#"[debounce]
window_secs = {window}

[queue]
url = "file://{queue}"

[table]
path = "{table}"

[gateway]
inventory = "{inventory}"

[log]
level = "warn"
"#,
            window = window_secs,
            queue = dir.path().join("queue").display(),
            table = dir.path().join("table").display(),
            inventory = inventory_path.display(),
        );
        fs::write(&config_path, config)?;

        let env = Self {
            dir,
            config_path,
            inventory_path,
        };
        env.write_inventory(&[])?;
        Ok(env)
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Config path as a CLI argument
    pub fn config_arg(&self) -> &str {
        self.config_path.to_str().unwrap_or_default()
    }

    /// Replace the share inventory
    pub fn write_inventory(&self, shares: &[Share<'_>]) -> Result<()> {
        let mut body = String::new();
        for share in shares {
            body.push_str("[[shares]]\n");
            body.push_str(&format!("arn = \"{}\"\n", share.arn));
            if let Some(share_type) = share.share_type {
                body.push_str(&format!("type = \"{}\"\n", share_type));
            }
            body.push_str(&format!("location = \"arn:aws:s3:::{}\"\n", share.bucket));
            body.push_str(&format!("deleted = {}\n\n", share.deleted));
        }
        fs::write(&self.inventory_path, body)?;
        Ok(())
    }

    /// Write a JSON document into the environment and return its path
    pub fn write_json(&self, name: &str, value: &Value) -> Result<String> {
        let path = self.dir.path().join(name);
        fs::write(&path, serde_json::to_string(value)?)?;
        Ok(path.display().to_string())
    }
}

/// One-record change notification batch
pub fn notification(bucket: &str, event_time: &str) -> Value {
    json!({"Records": [change_record(bucket, event_time, "AWS:AIDAEXAMPLE")]})
}

pub fn change_record(bucket: &str, event_time: &str, principal: &str) -> Value {
    json!({
        "eventTime": event_time,
        "eventName": "ObjectCreated:Put",
        "userIdentity": {"principalId": principal},
        "s3": {"bucket": {"name": bucket}}
    })
}

/// Released trigger batch as the queue delivers it
pub fn trigger_batch(buckets: &[&str]) -> Value {
    let records: Vec<Value> = buckets
        .iter()
        .map(|bucket| {
            json!({
                "messageAttributes": {
                    "bucket-name": {"dataType": "String", "stringValue": bucket},
                    "timestamp": {"dataType": "Number", "stringValue": "0"}
                },
                "body": "{}"
            })
        })
        .collect();
    json!({ "Records": records })
}
