//! Bucket and object name syntax checks.
//!
//! Names are checked before a request is built so a malformed name never
//! reaches the network.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

pub const MIN_BUCKET_NAME_LEN: usize = 3;
pub const MAX_BUCKET_NAME_LEN: usize = 63;
pub const MAX_OBJECT_NAME_LEN: usize = 1024;

const RESERVED_BUCKET_PREFIXES: &[&str] = &["xn--"];
const RESERVED_BUCKET_SUFFIXES: &[&str] = &["-s3alias"];

static BUCKET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9.\-]{1,61}[a-z0-9]$").expect("static regex"));

static IPV4_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.){3}\d+$").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Bucket,
    Object,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Bucket => write!(f, "bucket"),
            NameKind::Object => write!(f, "object"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} name {name:?}: {reason}")]
pub struct NameError {
    pub kind: NameKind,
    pub name: String,
    pub reason: &'static str,
}

impl NameError {
    fn bucket(name: &str, reason: &'static str) -> Self {
        Self { kind: NameKind::Bucket, name: name.to_string(), reason }
    }

    fn object(name: &str, reason: &'static str) -> Self {
        Self { kind: NameKind::Object, name: name.to_string(), reason }
    }
}

/// Checks a bucket name against the S3-compatible naming rules the
/// storage providers enforce.
pub fn check_bucket_name(name: &str) -> Result<(), NameError> {
    if name.trim().is_empty() {
        return Err(NameError::bucket(name, "name is empty"));
    }
    if name.len() < MIN_BUCKET_NAME_LEN {
        return Err(NameError::bucket(name, "name is shorter than 3 characters"));
    }
    if name.len() > MAX_BUCKET_NAME_LEN {
        return Err(NameError::bucket(name, "name is longer than 63 characters"));
    }
    if IPV4_LITERAL.is_match(name) {
        return Err(NameError::bucket(name, "name cannot be an IP address"));
    }
    if name.contains("..") || name.contains(".-") || name.contains("-.") {
        return Err(NameError::bucket(name, "name contains an invalid separator sequence"));
    }
    if RESERVED_BUCKET_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return Err(NameError::bucket(name, "name uses a reserved prefix"));
    }
    if RESERVED_BUCKET_SUFFIXES.iter().any(|s| name.ends_with(s)) {
        return Err(NameError::bucket(name, "name uses a reserved suffix"));
    }
    if !BUCKET_NAME.is_match(name) {
        return Err(NameError::bucket(
            name,
            "name must use lowercase letters, digits, '.' or '-' and start and end with a letter or digit",
        ));
    }
    Ok(())
}

pub fn check_object_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::object(name, "name is empty"));
    }
    if name.len() > MAX_OBJECT_NAME_LEN {
        return Err(NameError::object(name, "name is longer than 1024 bytes"));
    }
    if name.contains('\\') {
        return Err(NameError::object(name, "name contains a backslash"));
    }
    if name.chars().any(char::is_control) {
        return Err(NameError::object(name, "name contains a control character"));
    }
    if name.contains("//") {
        return Err(NameError::object(name, "name contains an empty path segment"));
    }
    if name.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(NameError::object(name, "name contains a relative path segment"));
    }
    Ok(())
}
