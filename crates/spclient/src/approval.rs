//! Approval pre-flight.
//!
//! Before a create-bucket or create-object transaction is broadcast, the
//! primary storage provider must approve it. The unsigned transaction
//! message travels hex-encoded in a header; the provider answers with the
//! signed message in `X-Gnfd-Signed-Msg`.

use spclient_auth::{AuthError, RequestDescriptor, Scope, check_bucket_name, check_object_name};
use spclient_route::{ChainAddress, ChainMetadata, RouteKey};
use spclient_transport::{CallContext, HttpClient, SendOptions};
use thiserror::Error;

use crate::client::SpClient;
use crate::error::Result;

const APPROVAL_PATH: &str = "get-approval";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalAction {
    CreateBucket,
    CreateObject,
}

impl ApprovalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalAction::CreateBucket => "CreateBucket",
            ApprovalAction::CreateObject => "CreateObject",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
    pub bucket_name: String,
    /// Present for object approvals.
    pub object_name: Option<String>,
    pub primary_sp_address: ChainAddress,
    /// Serialized unsigned create message.
    pub unsigned_msg: Vec<u8>,
}

impl ApprovalRequest {
    pub fn action(&self) -> ApprovalAction {
        if self.object_name.is_some() {
            ApprovalAction::CreateObject
        } else {
            ApprovalAction::CreateBucket
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    #[error("storage provider returned no signed message")]
    MissingSignedMsg,

    #[error("signed message is not valid hex: {0}")]
    InvalidSignedMsg(String),
}

impl<C: HttpClient, M: ChainMetadata> SpClient<C, M> {
    /// Asks the primary storage provider to approve a create message and
    /// returns the signed message bytes.
    pub async fn get_approval(&self, ctx: &CallContext, req: &ApprovalRequest) -> Result<Vec<u8>> {
        check_bucket_name(&req.bucket_name).map_err(AuthError::from)?;
        if let Some(object) = &req.object_name {
            check_object_name(object).map_err(AuthError::from)?;
        }

        let action = req.action();
        let mut desc = RequestDescriptor::get()
            .scope(Scope::Admin)
            .rel_path(APPROVAL_PATH)
            .query("action", action.as_str())
            .bucket(req.bucket_name.as_str())
            .unsigned_msg(hex::encode(&req.unsigned_msg));
        if let Some(object) = &req.object_name {
            desc = desc.object(object.as_str());
        }

        let endpoint = self
            .resolve_endpoint(RouteKey::Provider(req.primary_sp_address))
            .await?;

        let response = match self.send(ctx, &desc, &endpoint, SendOptions::buffered()).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    endpoint = %endpoint.base_url,
                    bucket = %req.bucket_name,
                    action = action.as_str(),
                    error = %e,
                    "approval rejected"
                );
                return Err(e);
            }
        };

        let signed = response
            .headers
            .signed_msg
            .ok_or(ApprovalError::MissingSignedMsg)?;
        hex::decode(signed.trim_start_matches("0x"))
            .map_err(|e| ApprovalError::InvalidSignedMsg(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use spclient_transport::mock::{MockHttpClient, MockReply};

    use super::*;
    use crate::ClientConfig;
    use crate::error::Error;
    use crate::test_support::{TestMetadata, TestSigner, addr};

    async fn client(replies: Vec<MockReply>) -> SpClient<MockHttpClient, TestMetadata> {
        SpClient::connect(
            ClientConfig::default(),
            MockHttpClient::with_replies(replies),
            TestMetadata::single("sp0.example.com"),
            Arc::new(TestSigner),
        )
        .await
        .unwrap()
    }

    fn request(object: Option<&str>) -> ApprovalRequest {
        ApprovalRequest {
            bucket_name: "photos".into(),
            object_name: object.map(str::to_string),
            primary_sp_address: addr(1),
            unsigned_msg: vec![0xde, 0xad, 0xbe, 0xef],
        }
    }

    #[tokio::test]
    async fn returns_decoded_signed_message() {
        let sp = client(vec![MockReply::ok("").with_header("X-Gnfd-Signed-Msg", "0a0b0c")]).await;

        let signed = sp.get_approval(&CallContext::new(), &request(None)).await.unwrap();
        assert_eq!(signed, vec![0x0a, 0x0b, 0x0c]);

        let sent = sp.transport().client().last_request().unwrap();
        assert_eq!(sent.url.path(), "/greenfield/admin/v1/get-approval");
        assert_eq!(sent.url.query(), Some("action=CreateBucket"));
        assert_eq!(sent.header("X-Gnfd-Unsigned-Msg"), Some("deadbeef"));
    }

    #[tokio::test]
    async fn object_name_selects_create_object() {
        let sp = client(vec![MockReply::ok("").with_header("X-Gnfd-Signed-Msg", "01")]).await;

        sp.get_approval(&CallContext::new(), &request(Some("a/b.txt")))
            .await
            .unwrap();
        let sent = sp.transport().client().last_request().unwrap();
        assert_eq!(sent.url.query(), Some("action=CreateObject"));
    }

    #[tokio::test]
    async fn missing_signed_message_is_an_error() {
        let sp = client(vec![MockReply::ok("")]).await;

        let err = sp.get_approval(&CallContext::new(), &request(None)).await.unwrap_err();
        assert!(matches!(err, Error::Approval(ApprovalError::MissingSignedMsg)));
    }

    #[tokio::test]
    async fn invalid_names_fail_before_sending() {
        let sp = client(vec![]).await;
        let mut req = request(None);
        req.bucket_name = "Bad_Bucket".into();

        let err = sp.get_approval(&CallContext::new(), &req).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::InvalidName(_))));
        assert_eq!(sp.transport().client().request_count(), 0);
    }
}
