//! Header names and fixed values of the storage provider HTTP protocol.

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_SHA256: &str = "X-Gnfd-Content-Sha256";
pub const DATE: &str = "X-Gnfd-Date";
pub const USER_ADDRESS: &str = "X-Gnfd-User-Address";
pub const UNSIGNED_MSG: &str = "X-Gnfd-Unsigned-Msg";
pub const SIGNED_MSG: &str = "X-Gnfd-Signed-Msg";
pub const INTEGRITY_HASH: &str = "X-Gnfd-Integrity-Hash";
pub const PIECE_HASH: &str = "X-Gnfd-Piece-Hash";
pub const REQUEST_ID: &str = "X-Gnfd-Request-Id";

pub const AUTH_V1: &str = "authTypeV1";
pub const SIGN_ALGORITHM: &str = "ECDSA-secp256k1";

/// SHA-256 of the empty string, sent when a request carries no body.
pub const EMPTY_STRING_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

pub const ADMIN_URL_PREFIX: &str = "/greenfield/admin";
pub const ADMIN_URL_VERSION: &str = "/v1";
