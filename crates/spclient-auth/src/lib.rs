//! Authenticated request construction for storage provider HTTP calls.
//!
//! A [`RequestDescriptor`] describes one logical call. The
//! [`RequestBuilder`] turns it into a [`SignedRequest`]: it validates bucket
//! and object names, places the bucket in the URL according to the
//! configured [`AddressingStyle`], derives the canonical request and signs
//! its SHA-256 digest through the caller's [`Signer`].
//!
//! The builder never touches the network.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use spclient_auth::{AuthContext, RequestBuilder, RequestDescriptor, Scope, Signer, SignerError};
//!
//! struct Demo;
//!
//! impl Signer for Demo {
//!     fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, SignerError> { Ok(msg.to_vec()) }
//!     fn address(&self) -> String { "0x00000000000000000000000000000000000000aa".into() }
//! }
//!
//! let auth = AuthContext::new(Arc::new(Demo));
//! let desc = RequestDescriptor::get().scope(Scope::Admin).rel_path("challenge");
//! let base = url::Url::parse("https://sp0.example.com").unwrap();
//!
//! let req = RequestBuilder::default().build_now(&desc, &base, &auth).unwrap();
//! assert!(req.header("Authorization").is_some());
//! ```

pub use self::builder::{AddressingStyle, RequestBuilder, SignedRequest, canonical_request, encode_path};
pub use self::descriptor::{Method, QueryParams, RequestDescriptor, Scope};
pub use self::error::{AuthError, Result, SignerError};
pub use self::name::{NameError, NameKind, check_bucket_name, check_object_name};
pub use self::signer::{AuthContext, Signer};

pub mod headers;

mod builder;
mod descriptor;
mod error;
mod name;
mod signer;
