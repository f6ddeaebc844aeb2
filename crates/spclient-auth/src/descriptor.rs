use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::headers::EMPTY_STRING_SHA256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }

    /// Safe methods may be replayed after a connection failure.
    pub fn is_safe(&self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which API surface of the storage provider a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Bucket/object reads and writes.
    #[default]
    Object,
    /// Administrative calls (approvals, challenges) served under the admin prefix.
    Admin,
}

/// Query parameters with unique keys, kept sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Sets a presence flag, rendered as `key=`.
    pub fn flag(&mut self, key: impl Into<String>) {
        self.0.insert(key.into(), String::new());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Form-urlencoded `k=v` pairs joined with `&`, keys in sorted order.
    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", form_escape(k), form_escape(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn form_escape(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Logical description of one outbound storage provider call.
///
/// # Examples
///
/// ```
/// use spclient_auth::{Method, RequestDescriptor, Scope};
///
/// let desc = RequestDescriptor::new(Method::Get)
///     .scope(Scope::Admin)
///     .rel_path("challenge")
///     .query("object-id", "42")
///     .query("piece-index", "3");
///
/// assert_eq!(desc.query_params().encode(), "object-id=42&piece-index=3");
/// ```
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub scope: Scope,
    pub rel_path: String,
    pub query: QueryParams,
    pub bucket: Option<String>,
    pub object: Option<String>,
    pub body: Bytes,
    pub content_sha256: String,
    /// Hex-encoded transaction bytes carried opaquely in a header.
    pub unsigned_msg: Option<String>,
}

impl RequestDescriptor {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            scope: Scope::Object,
            rel_path: String::new(),
            query: QueryParams::new(),
            bucket: None,
            object: None,
            body: Bytes::new(),
            content_sha256: EMPTY_STRING_SHA256.to_string(),
            unsigned_msg: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::Get)
    }

    #[must_use]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn rel_path(mut self, rel_path: impl Into<String>) -> Self {
        self.rel_path = rel_path.into();
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.set(key, value);
        self
    }

    #[must_use]
    pub fn query_flag(mut self, key: impl Into<String>) -> Self {
        self.query.flag(key);
        self
    }

    #[must_use]
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    #[must_use]
    pub fn object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Attaches a request body and records its SHA-256 digest.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.content_sha256 = if body.is_empty() {
            EMPTY_STRING_SHA256.to_string()
        } else {
            hex::encode(Sha256::digest(&body))
        };
        self.body = body;
        self
    }

    #[must_use]
    pub fn unsigned_msg(mut self, hex_msg: impl Into<String>) -> Self {
        self.unsigned_msg = Some(hex_msg.into());
        self
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_keys_are_sorted_and_unique() {
        let mut q = QueryParams::new();
        q.set("start-timestamp", "10");
        q.flag("list-read-record");
        q.set("max-records", "5");
        q.set("max-records", "7");

        assert_eq!(q.encode(), "list-read-record=&max-records=7&start-timestamp=10");
    }

    #[test]
    fn query_values_are_form_escaped() {
        let mut q = QueryParams::new();
        q.set("prefix", "a b/c&d");
        assert_eq!(q.encode(), "prefix=a+b%2Fc%26d");
    }

    #[test]
    fn empty_body_uses_sentinel_digest() {
        let desc = RequestDescriptor::get();
        assert_eq!(desc.content_sha256, EMPTY_STRING_SHA256);

        let desc = RequestDescriptor::get().body(Bytes::new());
        assert_eq!(desc.content_sha256, EMPTY_STRING_SHA256);
    }

    #[test]
    fn body_digest_is_recorded() {
        let desc = RequestDescriptor::new(Method::Put).body(&b"hello world"[..]);
        assert_eq!(
            desc.content_sha256,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn only_get_and_head_are_safe() {
        assert!(Method::Get.is_safe());
        assert!(Method::Head.is_safe());
        assert!(!Method::Post.is_safe());
        assert!(!Method::Put.is_safe());
        assert!(!Method::Delete.is_safe());
    }
}
