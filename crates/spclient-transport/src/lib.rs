//! HTTP transport for storage provider calls.
//!
//! # Architecture
//!
//! - [`HttpClient`] - the network seam, with [`ReqwestClient`] for production
//!   and `mock::MockHttpClient` (feature `test-util`) for tests
//! - [`Transport`] - retry, per-call timeout and cancellation on top of a client
//! - [`SpResponse`] - typed envelope; protocol headers are parsed once into
//!   [`SpHeaders`] and non-2xx answers become [`TransportError::HttpStatus`]
//!
//! Only safe methods (GET, HEAD) are retried. The policy is explicit and
//! injectable through [`RetryPolicy`].

mod client;
mod context;
mod error;
mod response;
mod retry;
mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::{HttpClient, RawResponse};
pub use context::CallContext;
pub use error::{Result, TransportError};
pub use response::{Body, BodyStream, BoxStream, SpErrorBody, SpHeaders, SpResponse};
pub use retry::{RetryPolicy, retry_delay};
pub use transport::{BodyMode, SendOptions, Transport};

#[cfg(feature = "reqwest")]
pub use client::ReqwestClient;

pub use tokio_util::sync::CancellationToken;
