//! Endpoint resolution.
//!
//! The resolver maps a bucket name, bucket id or provider address to the
//! [`SpEndpoint`] that serves it. Lookups read an immutable
//! [`SpDirectory`] snapshot; [`EndpointResolver::refresh`] builds a new
//! snapshot and swaps it in, so concurrent readers never observe a partly
//! updated directory. A refresh only happens when the caller asks for one.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::address::ChainAddress;
use crate::directory::{SpDirectory, SpEndpoint};
use crate::error::{Result, RouteError};
use crate::metadata::{BucketInfo, ChainMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKey<'a> {
    BucketName(&'a str),
    BucketId(&'a str),
    Provider(ChainAddress),
}

pub struct EndpointResolver<M> {
    metadata: M,
    secure: bool,
    directory: RwLock<Arc<SpDirectory>>,
}

impl<M: ChainMetadata> EndpointResolver<M> {
    /// Creates a resolver with an empty directory. Call
    /// [`refresh`](Self::refresh) before resolving.
    pub fn new(metadata: M, secure: bool) -> Self {
        Self::with_directory(metadata, secure, SpDirectory::default())
    }

    pub fn with_directory(metadata: M, secure: bool, directory: SpDirectory) -> Self {
        Self {
            metadata,
            secure,
            directory: RwLock::new(Arc::new(directory)),
        }
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn snapshot(&self) -> Arc<SpDirectory> {
        self.directory.read().clone()
    }

    /// Reloads the provider list from chain and swaps in a new snapshot.
    pub async fn refresh(&self) -> Result<Arc<SpDirectory>> {
        let providers = self
            .metadata
            .list_storage_providers()
            .await
            .map_err(RouteError::Refresh)?;

        let next = Arc::new(SpDirectory::from_providers(&providers, self.secure));
        tracing::debug!(
            providers = providers.len(),
            usable = next.len(),
            rejected = next.rejected().len(),
            "storage provider directory refreshed"
        );

        *self.directory.write() = next.clone();
        Ok(next)
    }

    pub fn resolve_address(&self, address: &ChainAddress) -> Result<SpEndpoint> {
        self.snapshot()
            .get(address)
            .cloned()
            .ok_or(RouteError::UnknownProvider(*address))
    }

    /// An in-service provider for calls that are not bucket scoped.
    pub fn in_service(&self) -> Result<SpEndpoint> {
        self.snapshot()
            .first_in_service()
            .cloned()
            .ok_or(RouteError::NoInServiceProvider)
    }

    pub async fn head_bucket(&self, bucket_name: &str) -> Result<BucketInfo> {
        self.metadata
            .head_bucket(bucket_name)
            .await
            .map_err(|source| RouteError::BucketLookup {
                key: bucket_name.to_string(),
                source,
            })
    }

    pub async fn resolve(&self, key: RouteKey<'_>) -> Result<SpEndpoint> {
        let address = match key {
            RouteKey::Provider(address) => address,
            RouteKey::BucketName(name) => self.head_bucket(name).await?.primary_sp_address,
            RouteKey::BucketId(id) => {
                self.metadata
                    .head_bucket_by_id(id)
                    .await
                    .map_err(|source| RouteError::BucketLookup {
                        key: id.to_string(),
                        source,
                    })?
                    .primary_sp_address
            }
        };
        self.resolve_address(&address)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::metadata::{MetadataError, SpStatus, StorageProviderInfo, Visibility};

    fn addr(n: u8) -> ChainAddress {
        ChainAddress::new([n; 20])
    }

    struct MockMetadata {
        providers: parking_lot::Mutex<Vec<StorageProviderInfo>>,
        list_calls: AtomicUsize,
    }

    impl MockMetadata {
        fn new(providers: Vec<StorageProviderInfo>) -> Self {
            Self {
                providers: parking_lot::Mutex::new(providers),
                list_calls: AtomicUsize::new(0),
            }
        }

        fn bucket(name: &str, primary: ChainAddress) -> BucketInfo {
            BucketInfo {
                bucket_name: name.to_string(),
                id: "7".to_string(),
                primary_sp_address: primary,
                payment_address: addr(9),
                visibility: Visibility::Private,
                charged_read_quota: 0,
            }
        }
    }

    impl ChainMetadata for MockMetadata {
        async fn head_bucket(&self, bucket_name: &str) -> std::result::Result<BucketInfo, MetadataError> {
            match bucket_name {
                "photos" => Ok(Self::bucket("photos", addr(1))),
                "orphan" => Ok(Self::bucket("orphan", addr(42))),
                other => Err(MetadataError::BucketNotFound(other.to_string())),
            }
        }

        async fn head_bucket_by_id(&self, bucket_id: &str) -> std::result::Result<BucketInfo, MetadataError> {
            match bucket_id {
                "7" => Ok(Self::bucket("photos", addr(1))),
                other => Err(MetadataError::BucketNotFound(other.to_string())),
            }
        }

        async fn list_storage_providers(
            &self,
        ) -> std::result::Result<Vec<StorageProviderInfo>, MetadataError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.providers.lock().clone())
        }
    }

    fn providers() -> Vec<StorageProviderInfo> {
        vec![
            StorageProviderInfo {
                operator_address: addr(1),
                endpoint: "sp1.example.com".to_string(),
                status: SpStatus::InService,
            },
            StorageProviderInfo {
                operator_address: addr(2),
                endpoint: "https://sp2.example.com".to_string(),
                status: SpStatus::InService,
            },
        ]
    }

    async fn resolver() -> EndpointResolver<MockMetadata> {
        let r = EndpointResolver::new(MockMetadata::new(providers()), true);
        r.refresh().await.unwrap();
        r
    }

    #[tokio::test]
    async fn resolves_provider_address() {
        let r = resolver().await;
        let ep = r.resolve(RouteKey::Provider(addr(2))).await.unwrap();
        assert_eq!(ep.base_url.as_str(), "https://sp2.example.com/");
    }

    #[tokio::test]
    async fn resolves_bucket_through_primary_sp() {
        let r = resolver().await;
        let by_name = r.resolve(RouteKey::BucketName("photos")).await.unwrap();
        let by_id = r.resolve(RouteKey::BucketId("7")).await.unwrap();
        assert_eq!(by_name.address, addr(1));
        assert_eq!(by_name, by_id);
    }

    #[tokio::test]
    async fn repeated_resolution_returns_same_endpoint() {
        let r = resolver().await;
        let a = r.resolve(RouteKey::BucketName("photos")).await.unwrap();
        let b = r.resolve(RouteKey::BucketName("photos")).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(r.metadata().list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_address_is_a_routing_error() {
        let r = resolver().await;
        let err = r.resolve(RouteKey::Provider(addr(77))).await.unwrap_err();
        assert!(matches!(err, RouteError::UnknownProvider(a) if a == addr(77)));

        let err = r.resolve(RouteKey::BucketName("orphan")).await.unwrap_err();
        assert!(matches!(err, RouteError::UnknownProvider(a) if a == addr(42)));
    }

    #[tokio::test]
    async fn missing_bucket_reports_lookup_failure() {
        let r = resolver().await;
        let err = r.resolve(RouteKey::BucketName("nope")).await.unwrap_err();
        assert!(matches!(err, RouteError::BucketLookup { .. }));
    }

    #[tokio::test]
    async fn empty_directory_before_refresh() {
        let r = EndpointResolver::new(MockMetadata::new(providers()), true);
        assert!(matches!(
            r.resolve_address(&addr(1)),
            Err(RouteError::UnknownProvider(_))
        ));
        assert!(matches!(r.in_service(), Err(RouteError::NoInServiceProvider)));
    }

    #[tokio::test]
    async fn refresh_replaces_snapshot_without_touching_old_one() {
        let r = resolver().await;
        let before = r.snapshot();

        r.metadata().providers.lock().push(StorageProviderInfo {
            operator_address: addr(3),
            endpoint: "sp3.example.com".to_string(),
            status: SpStatus::InService,
        });
        r.refresh().await.unwrap();

        assert!(before.get(&addr(3)).is_none());
        assert!(r.snapshot().get(&addr(3)).is_some());
        assert_eq!(before.len(), 2);
    }
}
