//! Bucket -> share handle resolution with a table-backed cache
//!
//! The shared table caches the gateway's answer per bucket. A cache miss
//! walks the full share inventory; a refresh failure against a cached handle
//! clears it so the next trigger resolves from the inventory again.
//!
//! Per bucket: `NO_HANDLE -> (resolve) -> HANDLE_CACHED -> (refresh fails)
//! -> NO_HANDLE`. Resolution itself is never persisted, so two dispatchers
//! may resolve the same bucket at once; both write the same answer.

use refresh_core::{
    BucketId, Field, FieldValue, GatewayError, KeyValueStore, ShareGateway, ShareHandle,
    ShareProtocol, StoreError, WriteCondition,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("reading cached share failed: {0}")]
    Table(#[from] StoreError),

    #[error("share lookup failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// Where a handle came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Served from the table without touching the gateway
    Cached(ShareHandle),
    /// Found in the gateway inventory (and written back to the table)
    Resolved(ShareHandle),
    /// No share is backed by the bucket
    NotFound,
}

impl Resolution {
    pub fn handle(&self) -> Option<&ShareHandle> {
        match self {
            Resolution::Cached(h) | Resolution::Resolved(h) => Some(h),
            Resolution::NotFound => None,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Resolution::Cached(_))
    }
}

/// Share handle resolver
#[derive(Clone)]
pub struct HandleResolver {
    table: Arc<dyn KeyValueStore>,
    gateway: Arc<dyn ShareGateway>,
}

impl HandleResolver {
    pub fn new(table: Arc<dyn KeyValueStore>, gateway: Arc<dyn ShareGateway>) -> Self {
        Self { table, gateway }
    }

    /// Resolve the share fronting `bucket`
    pub async fn resolve(&self, bucket: &BucketId) -> Result<Resolution, ResolveError> {
        if let Some(handle) = self.cached(bucket).await? {
            debug!(bucket = %bucket, share = %handle, "Share handle cache hit");
            return Ok(Resolution::Cached(handle));
        }

        let handle = match self.find_share(bucket).await? {
            Some(handle) => handle,
            None => return Ok(Resolution::NotFound),
        };

        info!(bucket = %bucket, share = %handle, "Resolved share from gateway inventory");
        self.store(bucket, &handle).await;
        Ok(Resolution::Resolved(handle))
    }

    /// Look the bucket up in the gateway inventory, bypassing the cache
    ///
    /// Shares are partitioned by protocol and each partition is described in
    /// `ShareProtocol::ALL` order; the first share whose backing location is
    /// the bucket wins.
    pub async fn find_share(&self, bucket: &BucketId) -> Result<Option<ShareHandle>, GatewayError> {
        let inventory = self.gateway.list_file_shares().await?;
        let location = bucket.location_arn();

        for protocol in ShareProtocol::ALL {
            let arns: Vec<ShareHandle> = inventory
                .iter()
                .filter(|share| share.protocol() == Some(protocol))
                .map(|share| share.arn.clone())
                .collect();
            if arns.is_empty() {
                continue;
            }

            let details = match self.gateway.describe_file_shares(protocol, &arns).await {
                Ok(details) => details,
                Err(GatewayError::InvalidGatewayRequest { message, .. }) => {
                    // Typically an untyped share that is not really NFS
                    warn!(
                        bucket = %bucket,
                        protocol = %protocol,
                        "Skipping {} shares, gateway rejected describe: {}",
                        protocol,
                        message
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let Some(detail) = details.into_iter().find(|d| d.location_arn == location) {
                return Ok(Some(detail.arn));
            }
        }

        debug!(bucket = %bucket, "No file share backed by bucket");
        Ok(None)
    }

    /// Forget the cached handle for `bucket`
    pub async fn invalidate(&self, bucket: &BucketId) -> Result<(), StoreError> {
        self.table.remove_field(bucket, Field::CachedHandle).await
    }

    async fn cached(&self, bucket: &BucketId) -> Result<Option<ShareHandle>, StoreError> {
        Ok(self
            .table
            .get(bucket)
            .await?
            .and_then(|record| record.cached_handle)
            .filter(|handle| !handle.is_empty()))
    }

    /// Best-effort write-back; a failure only costs a repeat lookup later
    async fn store(&self, bucket: &BucketId, handle: &ShareHandle) {
        let written = self
            .table
            .set_field(
                bucket,
                Field::CachedHandle,
                FieldValue::Text(handle.as_str().to_string()),
                WriteCondition::Always,
            )
            .await;
        if let Err(e) = written {
            warn!(bucket = %bucket, share = %handle, "Failed to cache share handle: {}", e);
        }
    }
}
