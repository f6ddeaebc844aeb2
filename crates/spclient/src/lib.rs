//! Storage provider client.
//!
//! # Architecture
//!
//! Every outbound call goes through the same pipeline:
//!
//! - [`spclient_route`] - resolves the storage provider that serves a bucket
//!   or address from an immutable directory snapshot
//! - [`spclient_auth`] - builds the canonical request and signs it
//! - [`spclient_transport`] - sends it with retry, timeout and cancellation
//!
//! On top of the pipeline this crate implements integrity challenges,
//! monthly quota queries, approval pre-flight and bucket listing.
//!
//! # Key Features
//!
//! - **Explicit refresh**: the provider directory only changes when
//!   [`SpClient::refresh_endpoints`] is called
//! - **Typed envelopes**: protocol headers are parsed once at the transport
//!   boundary
//! - **Honest listings**: undecodable bucket entries are reported as
//!   [`ListBucketsOutcome::Partial`]
//!
//! The library emits `tracing` events and never installs a subscriber.

mod approval;
mod bucket;
mod challenge;
mod client;
mod config;
mod error;
mod quota;

#[cfg(test)]
mod test_support;

pub use approval::{ApprovalAction, ApprovalError, ApprovalRequest};
pub use bucket::{
    BucketEntry, BucketInfoView, ListBucketsOutcome, ListBucketsResult, SkippedBucket,
    decode_list_buckets,
};
pub use challenge::{ChallengeError, ChallengeRequest, ChallengeResult};
pub use client::SpClient;
pub use config::{Addressing, ClientConfig, ConfigError, DEFAULT_ENCODE_SHARDS};
pub use error::{Error, Result};
pub use quota::{
    ListReadRecordOptions, QuotaError, QuotaInfo, QuotaRecordInfo, QuotaWindow, ReadRecord,
    quota_window, quota_window_at, year_month_label, year_month_label_at,
};

pub use spclient_auth::{self, AuthContext, Signer, SignerError};
pub use spclient_route::{self, ChainAddress, ChainMetadata, RouteKey, SpEndpoint};
pub use spclient_transport::{self, CallContext, CancellationToken, HttpClient, RetryPolicy};
