use sha2::{Digest, Sha256};
use spclient_auth::{Signer, SignerError};
use spclient_route::{
    BucketInfo, ChainAddress, ChainMetadata, MetadataError, SpStatus, StorageProviderInfo,
    Visibility,
};

pub fn addr(n: u8) -> ChainAddress {
    ChainAddress::new([n; 20])
}

/// Deterministic signer: sha256(key || msg).
pub struct TestSigner;

impl Signer for TestSigner {
    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, SignerError> {
        let mut h = Sha256::new();
        h.update(b"test-key");
        h.update(msg);
        Ok(h.finalize().to_vec())
    }

    fn address(&self) -> String {
        addr(0xaa).to_string()
    }
}

/// One in-service provider at `addr(1)` serving bucket `photos`.
pub struct TestMetadata {
    endpoint: String,
}

impl TestMetadata {
    pub fn single(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
        }
    }
}

impl ChainMetadata for TestMetadata {
    async fn head_bucket(&self, bucket_name: &str) -> Result<BucketInfo, MetadataError> {
        if bucket_name != "photos" {
            return Err(MetadataError::BucketNotFound(bucket_name.to_string()));
        }
        Ok(BucketInfo {
            bucket_name: bucket_name.to_string(),
            id: "7".to_string(),
            primary_sp_address: addr(1),
            payment_address: addr(0xaa),
            visibility: Visibility::Private,
            charged_read_quota: 0,
        })
    }

    async fn head_bucket_by_id(&self, bucket_id: &str) -> Result<BucketInfo, MetadataError> {
        Err(MetadataError::BucketNotFound(bucket_id.to_string()))
    }

    async fn list_storage_providers(&self) -> Result<Vec<StorageProviderInfo>, MetadataError> {
        Ok(vec![StorageProviderInfo {
            operator_address: addr(1),
            endpoint: self.endpoint.clone(),
            status: SpStatus::InService,
        }])
    }
}
