//! Typed response envelope.
//!
//! Provider headers are parsed once, here, into [`SpHeaders`]; callers
//! never look up raw header strings for the protocol headers.

use std::fmt;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use spclient_auth::headers;

use crate::error::Result;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// Response body, either still attached to the connection or fully read.
///
/// Dropping a streaming body releases the connection.
pub enum Body {
    Stream(BodyStream),
    Buffered(Bytes),
}

impl Body {
    pub fn empty() -> Self {
        Body::Buffered(Bytes::new())
    }

    /// Reads the remaining body into memory.
    pub async fn bytes(self) -> Result<Bytes> {
        match self {
            Body::Buffered(bytes) => Ok(bytes),
            Body::Stream(stream) => read_all(stream).await,
        }
    }

    pub fn into_stream(self) -> BodyStream {
        match self {
            Body::Stream(stream) => stream,
            Body::Buffered(bytes) => {
                Box::pin(futures_util::stream::once(async move { Ok(bytes) }))
            }
        }
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self, Body::Buffered(_))
    }

    /// Releases the body without reading it.
    pub fn close(self) {}
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Stream(_) => f.write_str("Body::Stream { ... }"),
            Body::Buffered(bytes) => f.debug_tuple("Body::Buffered").field(&bytes.len()).finish(),
        }
    }
}

pub(crate) async fn read_all(mut stream: BodyStream) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

/// Response headers with the provider's protocol headers pulled out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpHeaders {
    raw: Vec<(String, String)>,
    pub signed_msg: Option<String>,
    pub integrity_hash: Option<String>,
    /// `X-Gnfd-Piece-Hash` split on `,`, empty entries dropped.
    pub piece_hashes: Vec<String>,
    pub request_id: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

impl SpHeaders {
    pub fn from_pairs(raw: Vec<(String, String)>) -> Self {
        let lookup = |name: &str| {
            raw.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let piece_hashes = lookup(headers::PIECE_HASH)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            signed_msg: lookup(headers::SIGNED_MSG),
            integrity_hash: lookup(headers::INTEGRITY_HASH),
            piece_hashes,
            request_id: lookup(headers::REQUEST_ID),
            content_type: lookup("Content-Type"),
            content_length: lookup("Content-Length").and_then(|v| v.parse().ok()),
            raw,
        }
    }

    /// Case-insensitive lookup of any header.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.raw
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.raw.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug)]
pub struct SpResponse {
    pub status: u16,
    pub headers: SpHeaders,
    pub body: Body,
}

/// The provider's XML error document:
/// `<Error><Code/><Message/><RequestId/></Error>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename = "Error")]
pub struct SpErrorBody {
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "RequestId", default)]
    pub request_id: String,
}

impl SpErrorBody {
    /// Parses an error body; `None` when it is not the provider's XML shape.
    pub fn parse(body: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(body).ok()?;
        let parsed: Self = quick_xml::de::from_str(text).ok()?;
        if parsed.code.is_empty() && parsed.message.is_empty() {
            return None;
        }
        Some(parsed)
    }
}

impl fmt::Display for SpErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if !self.request_id.is_empty() {
            write!(f, " (request id {})", self.request_id)?;
        }
        Ok(())
    }
}
