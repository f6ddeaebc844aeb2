//! Error types for spclient-transport.

use std::time::Duration;

use thiserror::Error;

use crate::response::SpErrorBody;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to {url} failed: {message}")]
    Connect { url: String, message: String },

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} returned HTTP {status}{}", describe(.error))]
    HttpStatus {
        url: String,
        status: u16,
        error: Option<SpErrorBody>,
        body: String,
        /// Whether the retry policy in force treats `status` as transient.
        retryable: bool,
    },

    #[error("reading response body from {url} failed: {message}")]
    Body { url: String, message: String },

    #[error("call cancelled")]
    Cancelled,

    #[error("call deadline exceeded")]
    DeadlineExceeded,
}

impl TransportError {
    /// HTTP status of the failed call, if the provider answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Transient under the retry policy of the transport that produced it.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Connect { .. } | TransportError::Timeout { .. } => true,
            TransportError::HttpStatus { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

fn describe(error: &Option<SpErrorBody>) -> String {
    match error {
        Some(e) => format!(": {e}"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
