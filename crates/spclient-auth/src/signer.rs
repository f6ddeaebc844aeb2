use std::fmt;
use std::sync::Arc;

use crate::error::SignerError;

/// Key management seam.
///
/// The signer receives the SHA-256 digest of the canonical request and
/// returns raw signature bytes. Key storage and the signature scheme are
/// the implementation's concern.
pub trait Signer: Send + Sync {
    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, SignerError>;

    /// Account address of the key, as sent in the user-address header.
    fn address(&self) -> String;
}

/// Signer identity shared by every request a client builds.
#[derive(Clone)]
pub struct AuthContext {
    signer: Arc<dyn Signer>,
    address: String,
}

impl AuthContext {
    pub fn new(signer: Arc<dyn Signer>) -> Self {
        let address = signer.address();
        Self { signer, address }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, SignerError> {
        self.signer.sign(msg)
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("address", &self.address)
            .field("signer", &"{ ... }")
            .finish()
    }
}
