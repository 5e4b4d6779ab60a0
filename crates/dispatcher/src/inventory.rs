//! File-backed share gateway for local runs
//!
//! The inventory is a TOML file of shares:
//! ```toml
//! [[shares]]
//! arn = "arn:aws:storagegateway:us-east-1:111122223333:share/share-1"
//! type = "NFS"                  # optional, older inventories omit it
//! location = "arn:aws:s3:::b1"
//! deleted = false               # refreshes against deleted shares fail
//! ```

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use refresh_core::{
    FileShareDetail, FileShareInfo, GatewayError, ShareGateway, ShareHandle, ShareProtocol,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to read inventory {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse inventory: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One share as listed in the inventory file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryShare {
    pub arn: ShareHandle,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub share_type: Option<String>,
    pub location: String,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Default, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    shares: Vec<InventoryShare>,
}

/// Gateway answering from an in-memory share inventory
#[derive(Debug, Default)]
pub struct InventoryGateway {
    shares: RwLock<Vec<InventoryShare>>,
    refreshed: Mutex<Vec<ShareHandle>>,
    list_calls: AtomicUsize,
}

impl InventoryGateway {
    pub fn new(shares: Vec<InventoryShare>) -> Self {
        Self {
            shares: RwLock::new(shares),
            ..Default::default()
        }
    }

    /// Load an inventory file
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        let raw = std::fs::read_to_string(path).map_err(|source| InventoryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, InventoryError> {
        let file: InventoryFile = toml::from_str(raw)?;
        Ok(Self::new(file.shares))
    }

    /// Replace a share's entry, or add it
    pub fn upsert_share(&self, share: InventoryShare) {
        let mut shares = self.shares.write();
        match shares.iter_mut().find(|s| s.arn == share.arn) {
            Some(existing) => *existing = share,
            None => shares.push(share),
        }
    }

    /// Mark a share deleted; it disappears from listings and refreshes fail
    pub fn delete_share(&self, arn: &ShareHandle) {
        if let Some(share) = self.shares.write().iter_mut().find(|s| &s.arn == arn) {
            share.deleted = true;
        }
    }

    /// Shares refreshed so far, in call order
    pub fn refreshed(&self) -> Vec<ShareHandle> {
        self.refreshed.lock().clone()
    }

    /// Number of inventory listings served
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShareGateway for InventoryGateway {
    async fn list_file_shares(&self) -> Result<Vec<FileShareInfo>, GatewayError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .shares
            .read()
            .iter()
            .filter(|s| !s.deleted)
            .map(|s| FileShareInfo {
                arn: s.arn.clone(),
                share_type: s.share_type.clone(),
            })
            .collect())
    }

    async fn describe_file_shares(
        &self,
        protocol: ShareProtocol,
        arns: &[ShareHandle],
    ) -> Result<Vec<FileShareDetail>, GatewayError> {
        let shares = self.shares.read();
        let mut details = Vec::with_capacity(arns.len());

        for arn in arns {
            let share = shares
                .iter()
                .find(|s| &s.arn == arn && !s.deleted)
                .ok_or_else(|| GatewayError::ShareNotFound(arn.clone()))?;

            // The real API rejects the whole call when one share is of the
            // other protocol
            if ShareProtocol::from_declared(share.share_type.as_deref()) != Some(protocol) {
                return Err(GatewayError::InvalidGatewayRequest {
                    operation: "describe_file_shares",
                    message: format!("{} is not an {} file share", arn, protocol),
                });
            }

            details.push(FileShareDetail {
                arn: share.arn.clone(),
                location_arn: share.location.clone(),
            });
        }

        Ok(details)
    }

    async fn refresh_cache(&self, arn: &ShareHandle) -> Result<(), GatewayError> {
        let exists = self
            .shares
            .read()
            .iter()
            .any(|s| &s.arn == arn && !s.deleted);
        if !exists {
            return Err(GatewayError::ShareNotFound(arn.clone()));
        }

        info!(share = %arn, "Refreshing file share cache");
        self.refreshed.lock().push(arn.clone());
        Ok(())
    }
}
