use std::future::Future;

use crate::address::ChainAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    PublicRead,
    #[default]
    Private,
    Inherit,
}

/// Canonical on-chain state of a bucket, as far as routing needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketInfo {
    pub bucket_name: String,
    pub id: String,
    pub primary_sp_address: ChainAddress,
    pub payment_address: ChainAddress,
    pub visibility: Visibility,
    pub charged_read_quota: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpStatus {
    InService,
    InJailed,
    GracefulExiting,
    InMaintenance,
}

/// A storage provider as registered on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageProviderInfo {
    pub operator_address: ChainAddress,
    /// Endpoint as registered; may omit the scheme.
    pub endpoint: String,
    pub status: SpStatus,
}

/// Failure reported by the chain metadata collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("bucket {0} not found on chain")]
    BucketNotFound(String),

    #[error("chain query failed: {0}")]
    Query(String),
}

/// On-chain metadata queries the resolver depends on.
///
/// Implementations wrap the chain's gRPC query client. Mock
/// implementations are used in tests.
pub trait ChainMetadata: Send + Sync {
    fn head_bucket(
        &self,
        bucket_name: &str,
    ) -> impl Future<Output = Result<BucketInfo, MetadataError>> + Send;

    fn head_bucket_by_id(
        &self,
        bucket_id: &str,
    ) -> impl Future<Output = Result<BucketInfo, MetadataError>> + Send;

    fn list_storage_providers(
        &self,
    ) -> impl Future<Output = Result<Vec<StorageProviderInfo>, MetadataError>> + Send;
}
