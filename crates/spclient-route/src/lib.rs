//! Storage provider endpoint routing.
//!
//! # Architecture
//!
//! Routing is a read of an immutable [`SpDirectory`] snapshot. The snapshot
//! is built from the chain's provider registry through the
//! [`ChainMetadata`] trait, the only contract between this crate and the
//! chain query layer. Bucket routes go through the bucket's primary
//! storage provider address.
//!
//! Routing failures are configuration problems (unknown provider, stale
//! directory) and are never retried here.

pub use address::{ChainAddress, ParseAddressError};
pub use directory::{RejectedEndpoint, SpDirectory, SpEndpoint};
pub use error::{Result, RouteError};
pub use metadata::{BucketInfo, ChainMetadata, MetadataError, SpStatus, StorageProviderInfo, Visibility};
pub use resolver::{EndpointResolver, RouteKey};

mod address;
mod directory;
mod error;
mod metadata;
mod resolver;
