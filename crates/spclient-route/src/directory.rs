use std::collections::HashMap;

use url::Url;

use crate::address::ChainAddress;
use crate::metadata::{SpStatus, StorageProviderInfo};

/// Resolved HTTP endpoint of one storage provider. Never mutated; a refresh
/// produces new values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpEndpoint {
    pub address: ChainAddress,
    pub base_url: Url,
    pub secure: bool,
}

/// A registered endpoint that could not be turned into a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEndpoint {
    pub address: ChainAddress,
    pub endpoint: String,
    pub reason: String,
}

/// Immutable snapshot of the known storage providers.
#[derive(Debug, Clone, Default)]
pub struct SpDirectory {
    by_address: HashMap<ChainAddress, SpEndpoint>,
    in_service: Vec<ChainAddress>,
    rejected: Vec<RejectedEndpoint>,
}

impl SpDirectory {
    /// Builds a snapshot from the chain's provider list. Endpoints without a
    /// scheme get `https://` when `secure` is set, `http://` otherwise.
    pub fn from_providers(providers: &[StorageProviderInfo], secure: bool) -> Self {
        let mut dir = Self::default();
        for sp in providers {
            match normalize_endpoint(&sp.endpoint, secure) {
                Ok(base_url) => {
                    let endpoint = SpEndpoint {
                        address: sp.operator_address,
                        secure: base_url.scheme() == "https",
                        base_url,
                    };
                    if sp.status == SpStatus::InService
                        && !dir.in_service.contains(&sp.operator_address)
                    {
                        dir.in_service.push(sp.operator_address);
                    }
                    dir.by_address.insert(sp.operator_address, endpoint);
                }
                Err(reason) => {
                    tracing::warn!(
                        address = %sp.operator_address,
                        endpoint = %sp.endpoint,
                        %reason,
                        "skipping storage provider with unusable endpoint"
                    );
                    dir.rejected.push(RejectedEndpoint {
                        address: sp.operator_address,
                        endpoint: sp.endpoint.clone(),
                        reason,
                    });
                }
            }
        }
        dir
    }

    pub fn get(&self, address: &ChainAddress) -> Option<&SpEndpoint> {
        self.by_address.get(address)
    }

    /// First in-service provider in registration order.
    pub fn first_in_service(&self) -> Option<&SpEndpoint> {
        self.in_service.iter().find_map(|a| self.by_address.get(a))
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }

    pub fn rejected(&self) -> &[RejectedEndpoint] {
        &self.rejected
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &SpEndpoint> {
        self.by_address.values()
    }
}

fn normalize_endpoint(raw: &str, secure: bool) -> Result<Url, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("endpoint is empty".to_string());
    }
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else if secure {
        format!("https://{raw}")
    } else {
        format!("http://{raw}")
    };
    let url = Url::parse(&with_scheme).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("endpoint has no host".to_string());
    }
    Ok(url)
}
