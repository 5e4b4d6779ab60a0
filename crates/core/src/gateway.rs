//! File-share gateway interface
//!
//! Mirrors the slice of the gateway API the dispatcher needs: a flat share
//! inventory, per-protocol detail listings and the cache refresh call.

use crate::error::GatewayError;
use crate::model::ShareHandle;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Share protocol partitions, in resolution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShareProtocol {
    #[serde(rename = "NFS")]
    Nfs,
    #[serde(rename = "SMB")]
    Smb,
}

impl ShareProtocol {
    pub const ALL: [ShareProtocol; 2] = [ShareProtocol::Nfs, ShareProtocol::Smb];

    /// Classify an inventory entry by its declared type
    ///
    /// Older gateway API surfaces omit the type entirely; those entries are
    /// treated as NFS. Unknown types yield `None` and are not considered.
    pub fn from_declared(share_type: Option<&str>) -> Option<ShareProtocol> {
        match share_type {
            None => Some(ShareProtocol::Nfs),
            Some(t) if t.eq_ignore_ascii_case("NFS") => Some(ShareProtocol::Nfs),
            Some(t) if t.eq_ignore_ascii_case("SMB") => Some(ShareProtocol::Smb),
            Some(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShareProtocol::Nfs => "NFS",
            ShareProtocol::Smb => "SMB",
        }
    }
}

impl fmt::Display for ShareProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inventory entry from the share listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileShareInfo {
    pub arn: ShareHandle,
    /// Declared protocol; absent on older API surfaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_type: Option<String>,
}

impl FileShareInfo {
    pub fn protocol(&self) -> Option<ShareProtocol> {
        ShareProtocol::from_declared(self.share_type.as_deref())
    }
}

/// Protocol-specific detail record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileShareDetail {
    pub arn: ShareHandle,
    /// Storage location backing the share, e.g. `arn:aws:s3:::bucket`
    pub location_arn: String,
}

/// The gateway fronting the storage buckets
#[async_trait]
pub trait ShareGateway: Send + Sync {
    /// Every file share on the gateway
    async fn list_file_shares(&self) -> Result<Vec<FileShareInfo>, GatewayError>;

    /// Detail records for the given shares of one protocol
    async fn describe_file_shares(
        &self,
        protocol: ShareProtocol,
        shares: &[ShareHandle],
    ) -> Result<Vec<FileShareDetail>, GatewayError>;

    /// Ask the gateway to re-list the share's backing bucket
    async fn refresh_cache(&self, share: &ShareHandle) -> Result<(), GatewayError>;
}
