//! Error types for spclient.

use spclient_auth::AuthError;
use spclient_route::RouteError;
use spclient_transport::TransportError;
use thiserror::Error;

use crate::approval::ApprovalError;
use crate::challenge::ChallengeError;
use crate::config::ConfigError;
use crate::quota::QuotaError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Challenge(#[from] ChallengeError),

    /// A challenge call failed after validation.
    #[error("challenge of object {object_id} piece {piece_index} via {endpoint} failed: {source}")]
    ChallengeCall {
        endpoint: String,
        object_id: String,
        piece_index: i32,
        #[source]
        source: Box<Error>,
    },

    #[error("malformed challenge response from {endpoint} for object {object_id} piece {piece_index}: {reason}")]
    ChallengeResponseMalformed {
        endpoint: String,
        object_id: String,
        piece_index: i32,
        reason: String,
    },

    #[error(transparent)]
    Quota(#[from] QuotaError),

    #[error(transparent)]
    Approval(#[from] ApprovalError),

    #[error("failed to decode {what}: {message}")]
    Decode { what: &'static str, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether repeating the same call may succeed.
    ///
    /// Only transport failures are transient. Validation, routing, signing
    /// and protocol errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_retryable(),
            Error::ChallengeCall { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    pub(crate) fn decode(what: &'static str, err: impl std::fmt::Display) -> Self {
        Error::Decode {
            what,
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
