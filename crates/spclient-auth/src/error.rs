use crate::name::NameError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    InvalidName(#[from] NameError),

    #[error("signer failed: {0}")]
    Signer(#[from] SignerError),

    #[error("invalid request url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Failure reported by a [`Signer`](crate::Signer) implementation.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct SignerError(pub String);

pub type Result<T> = std::result::Result<T, AuthError>;
