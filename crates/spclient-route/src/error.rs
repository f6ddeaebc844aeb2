//! Error types for endpoint resolution.

use thiserror::Error;

use crate::address::ChainAddress;
use crate::metadata::MetadataError;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("storage provider {0} is not in the directory")]
    UnknownProvider(ChainAddress),

    #[error("no in-service storage provider in the directory")]
    NoInServiceProvider,

    #[error("bucket lookup for {key} failed: {source}")]
    BucketLookup {
        key: String,
        #[source]
        source: MetadataError,
    },

    #[error("storage provider directory refresh failed: {0}")]
    Refresh(#[source] MetadataError),
}

pub type Result<T> = std::result::Result<T, RouteError>;
