use std::sync::Arc;

use sha2::{Digest, Sha256};
use spclient::spclient_route::{
    BucketInfo, MetadataError, SpStatus, StorageProviderInfo, Visibility,
};
use spclient::spclient_transport::ReqwestClient;
use spclient::{ChainAddress, ChainMetadata, ClientConfig, Signer, SignerError, SpClient};
use wiremock::MockServer;

pub fn addr(n: u8) -> ChainAddress {
    ChainAddress::new([n; 20])
}

pub struct TestSigner;

impl Signer for TestSigner {
    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, SignerError> {
        Ok(Sha256::digest(msg).to_vec())
    }

    fn address(&self) -> String {
        addr(0xaa).to_string()
    }
}

/// Chain view with a single provider, `addr(1)`, at the mock server.
pub struct MockChain {
    endpoint: String,
}

impl ChainMetadata for MockChain {
    async fn head_bucket(&self, bucket_name: &str) -> Result<BucketInfo, MetadataError> {
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

pub fn test_config() -> ClientConfig {
    ClientConfig {
        secure: false,
        timeout_secs: 5,
        retry_base_ms: 10,
        retry_max_ms: 100,
        retry_jitter_ms: 0,
        ..ClientConfig::default()
    }
}

/// Build an SpClient whose only provider is the wiremock server.
pub async fn test_client(server: &MockServer) -> SpClient<ReqwestClient, MockChain> {
    SpClient::connect(
        test_config(),
        ReqwestClient::new().unwrap(),
        MockChain {
            endpoint: server.uri(),
        },
        Arc::new(TestSigner),
    )
    .await
    .unwrap()
}
