//! Canonical request construction and signing.
//!
//! The builder is pure: given a descriptor, the target base URL, the signer
//! and a timestamp it always produces the same [`SignedRequest`]. Nothing in
//! this module touches the network.

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use url::Url;

use crate::descriptor::{Method, RequestDescriptor, Scope};
use crate::error::{AuthError, Result};
use crate::headers;
use crate::name::{check_bucket_name, check_object_name};
use crate::signer::AuthContext;

/// How a bucket is placed in the request URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressingStyle {
    /// `https://{bucket}.{host}/{object}`
    VirtualHost,
    /// `https://{host}/{bucket}/{object}`
    #[default]
    Path,
}

/// A fully authenticated request ready for the transport.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl SignedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestBuilder {
    style: AddressingStyle,
}

impl RequestBuilder {
    pub fn new(style: AddressingStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> AddressingStyle {
        self.style
    }

    pub fn build_now(
        &self,
        desc: &RequestDescriptor,
        base_url: &Url,
        auth: &AuthContext,
    ) -> Result<SignedRequest> {
        self.build(desc, base_url, auth, Utc::now())
    }

    pub fn build(
        &self,
        desc: &RequestDescriptor,
        base_url: &Url,
        auth: &AuthContext,
        now: DateTime<Utc>,
    ) -> Result<SignedRequest> {
        if let Some(bucket) = &desc.bucket {
            check_bucket_name(bucket)?;
        }
        if let Some(object) = &desc.object {
            check_object_name(object)?;
        }

        let url = self.request_url(desc, base_url)?;

        let mut headers = vec![
            (headers::CONTENT_SHA256.to_string(), desc.content_sha256.clone()),
            (
                headers::DATE.to_string(),
                now.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            (headers::USER_ADDRESS.to_string(), auth.address().to_string()),
        ];
        if let Some(msg) = &desc.unsigned_msg {
            headers.push((headers::UNSIGNED_MSG.to_string(), msg.clone()));
        }

        let canonical = canonical_request(desc.method, &url, &headers)?;
        let digest = Sha256::digest(canonical.as_bytes());
        let signature = auth.sign(&digest)?;

        headers.push((
            headers::AUTHORIZATION.to_string(),
            format!(
                "{} {}, SignedMsg={}, Signature={}",
                headers::AUTH_V1,
                headers::SIGN_ALGORITHM,
                hex::encode(digest),
                hex::encode(signature)
            ),
        ));

        Ok(SignedRequest {
            method: desc.method,
            url,
            headers,
            body: desc.body.clone(),
        })
    }

    fn request_url(&self, desc: &RequestDescriptor, base_url: &Url) -> Result<Url> {
        let scheme = base_url.scheme();
        let host = host_with_port(base_url).ok_or_else(|| AuthError::InvalidUrl {
            url: base_url.to_string(),
            reason: "endpoint has no host".to_string(),
        })?;

        let mut raw = match (desc.scope, &desc.bucket) {
            (Scope::Admin, _) => format!(
                "{scheme}://{host}{}{}/",
                headers::ADMIN_URL_PREFIX,
                headers::ADMIN_URL_VERSION
            ),
            (Scope::Object, Some(bucket)) => {
                let mut s = match self.style {
                    AddressingStyle::VirtualHost => format!("{scheme}://{bucket}.{host}/"),
                    AddressingStyle::Path => format!("{scheme}://{host}/{bucket}/"),
                };
                if let Some(object) = &desc.object {
                    s.push_str(&encode_path(object));
                }
                s
            }
            (Scope::Object, None) => {
                if let Some(object) = &desc.object {
                    return Err(AuthError::InvalidUrl {
                        url: base_url.to_string(),
                        reason: format!("object {object} given without a bucket"),
                    });
                }
                format!("{scheme}://{host}/")
            }
        };

        if !desc.rel_path.is_empty() {
            raw.push_str(&encode_path(&desc.rel_path));
        }
        if !desc.query.is_empty() {
            raw.push('?');
            raw.push_str(&desc.query.encode());
        }

        Url::parse(&raw).map_err(|e| AuthError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })
    }
}

fn host_with_port(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Percent-encodes every byte outside the unreserved set, keeping `/`.
pub fn encode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for b in path.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Newline-joined canonical form of a request:
/// method, path, query, canonical headers, signed header names.
pub fn canonical_request(method: Method, url: &Url, headers: &[(String, String)]) -> Result<String> {
    let host = host_with_port(url).ok_or_else(|| AuthError::InvalidUrl {
        url: url.to_string(),
        reason: "request has no host".to_string(),
    })?;

    let mut signed: Vec<(String, String)> = headers
        .iter()
        .filter(|(k, _)| !k.eq_ignore_ascii_case(headers::AUTHORIZATION))
        .map(|(k, v)| (k.to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    signed.push(("host".to_string(), host));
    signed.sort();

    let canonical_headers = signed
        .iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join("\n");
    let signed_names = signed
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");

    Ok([
        method.as_str(),
        url.path(),
        url.query().unwrap_or(""),
        canonical_headers.as_str(),
        signed_names.as_str(),
    ]
    .join("\n"))
}
