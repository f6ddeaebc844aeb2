//! Integrity challenges.
//!
//! A challenge asks a storage provider for one piece of an object together
//! with the piece hashes it committed to on chain. The response is only
//! accepted when it carries both the integrity hash and at least two piece
//! hashes; the piece body stays open for the caller.

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use spclient_auth::{RequestDescriptor, Scope};
use spclient_route::{ChainAddress, ChainMetadata, RouteKey};
use spclient_transport::{Body, CallContext, HttpClient, SendOptions, SpResponse};
use thiserror::Error;

use crate::client::SpClient;
use crate::error::{Error, Result};

const CHALLENGE_PATH: &str = "challenge";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRequest {
    pub object_id: String,
    pub piece_index: i32,
    pub sp_address: Option<ChainAddress>,
}

impl ChallengeRequest {
    pub fn new(object_id: impl Into<String>, piece_index: i32, sp_address: ChainAddress) -> Self {
        Self {
            object_id: object_id.into(),
            piece_index,
            sp_address: Some(sp_address),
        }
    }

    /// Checks the request without touching the network and returns the
    /// provider to challenge.
    pub fn validate(&self, encode_shards: u32) -> std::result::Result<ChainAddress, ChallengeError> {
        if self.object_id.is_empty() {
            return Err(ChallengeError::MissingObjectId);
        }
        let in_range = u32::try_from(self.piece_index).is_ok_and(|i| i <= encode_shards);
        if !in_range {
            return Err(ChallengeError::PieceIndexOutOfRange {
                index: self.piece_index,
                max: encode_shards,
            });
        }
        self.sp_address.ok_or(ChallengeError::MissingSpAddress)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChallengeError {
    #[error("challenge object id is empty")]
    MissingObjectId,

    #[error("piece index {index} outside 0..={max}")]
    PieceIndexOutOfRange { index: i32, max: u32 },

    #[error("challenged storage provider address is missing")]
    MissingSpAddress,

    #[error("no piece hash at position {position} ({available} available)")]
    PiecePositionOutOfRange { position: usize, available: usize },

    #[error("piece hash {0} is not valid hex")]
    InvalidPieceHash(String),

    #[error("piece data does not match piece hash at position {position}")]
    PieceHashMismatch { position: usize },

    #[error("piece hashes do not match the integrity hash")]
    IntegrityHashMismatch,
}

/// Proof material returned by a storage provider.
///
/// `piece_data` is owned by the holder; dropping the result or calling
/// [`Body::close`] releases the connection.
#[derive(Debug)]
pub struct ChallengeResult {
    pub piece_data: Body,
    pub integrity_hash: String,
    pub piece_hashes: Vec<String>,
}

impl ChallengeResult {
    /// Whether `integrity_hash` is the SHA-256 of the concatenated piece hashes.
    pub fn integrity_matches(&self) -> bool {
        self.check_integrity().is_ok()
    }

    fn check_integrity(&self) -> std::result::Result<(), ChallengeError> {
        let mut hasher = Sha256::new();
        for h in &self.piece_hashes {
            let raw = hex::decode(h).map_err(|_| ChallengeError::InvalidPieceHash(h.clone()))?;
            hasher.update(&raw);
        }
        let expected = hex::encode(hasher.finalize());
        if expected.eq_ignore_ascii_case(&self.integrity_hash) {
            Ok(())
        } else {
            Err(ChallengeError::IntegrityHashMismatch)
        }
    }

    /// Streams the piece through SHA-256 and checks it against the hash at
    /// `position`, then checks the integrity hash. Returns the verified piece.
    pub async fn verify_piece(self, position: usize) -> Result<Bytes> {
        let expected = self
            .piece_hashes
            .get(position)
            .ok_or(ChallengeError::PiecePositionOutOfRange {
                position,
                available: self.piece_hashes.len(),
            })?
            .clone();
        self.check_integrity()?;

        let mut hasher = Sha256::new();
        let mut data = BytesMut::new();
        let mut stream = self.piece_data.into_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            hasher.update(&chunk);
            data.extend_from_slice(&chunk);
        }

        if !hex::encode(hasher.finalize()).eq_ignore_ascii_case(&expected) {
            return Err(ChallengeError::PieceHashMismatch { position }.into());
        }
        Ok(data.freeze())
    }
}

impl<C: HttpClient, M: ChainMetadata> SpClient<C, M> {
    /// Challenges a storage provider for one piece of an object.
    pub async fn challenge(&self, ctx: &CallContext, req: &ChallengeRequest) -> Result<ChallengeResult> {
        let sp_address = req.validate(self.config().encode_shards)?;

        let wrap = |endpoint: String| {
            let object_id = req.object_id.clone();
            let piece_index = req.piece_index;
            move |source: Error| Error::ChallengeCall {
                endpoint,
                object_id,
                piece_index,
                source: Box::new(source),
            }
        };

        let endpoint = self
            .resolve_endpoint(RouteKey::Provider(sp_address))
            .await
            .map_err(wrap(sp_address.to_string()))?;
        let endpoint_url = endpoint.base_url.to_string();

        let desc = RequestDescriptor::get()
            .scope(Scope::Admin)
            .rel_path(CHALLENGE_PATH)
            .query("object-id", req.object_id.as_str())
            .query("piece-index", req.piece_index.to_string())
            .query("sp-address", sp_address.to_string());

        let response = self
            .send(ctx, &desc, &endpoint, SendOptions::streaming())
            .await
            .map_err(wrap(endpoint_url.clone()))?;

        let SpResponse { headers, body, .. } = response;
        let malformed = |reason: &str| Error::ChallengeResponseMalformed {
            endpoint: endpoint_url.clone(),
            object_id: req.object_id.clone(),
            piece_index: req.piece_index,
            reason: reason.to_string(),
        };

        let Some(integrity_hash) = headers.integrity_hash else {
            body.close();
            tracing::warn!(endpoint = %endpoint_url, object_id = %req.object_id, "challenge response without integrity hash");
            return Err(malformed("missing integrity hash"));
        };
        if headers.piece_hashes.len() < 2 {
            body.close();
            tracing::warn!(
                endpoint = %endpoint_url,
                object_id = %req.object_id,
                piece_hashes = headers.piece_hashes.len(),
                "challenge response without enough piece hashes"
            );
            return Err(malformed(if headers.piece_hashes.is_empty() {
                "missing piece hashes"
            } else {
                "fewer than two piece hashes"
            }));
        }

        Ok(ChallengeResult {
            piece_data: body,
            integrity_hash,
            piece_hashes: headers.piece_hashes,
        })
    }
}
