//! Bucket listing.
//!
//! The listing is served by any in-service storage provider as JSON. Entries
//! that no longer match the expected shape are reported, not dropped
//! silently: the outcome is [`ListBucketsOutcome::Partial`] whenever at least
//! one entry was skipped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use spclient_auth::RequestDescriptor;
use spclient_route::ChainMetadata;
use spclient_transport::{CallContext, HttpClient, SendOptions};

use crate::client::SpClient;
use crate::error::{Error, Result};

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfoView {
    #[serde(default)]
    pub owner: String,
    pub bucket_name: String,
    #[serde(default)]
    pub visibility: String,
    #[serde_as(as = "DisplayFromStr")]
    pub id: u64,
    #[serde(default)]
    pub source_type: String,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub payment_address: String,
    #[serde(default)]
    pub primary_sp_address: String,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default)]
    pub charged_read_quota: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntry {
    pub bucket_info: BucketInfoView,
    #[serde(default)]
    pub removed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBucketsResult {
    pub buckets: Vec<BucketEntry>,
}

impl ListBucketsResult {
    /// Buckets that have not been removed.
    pub fn active(&self) -> impl Iterator<Item = &BucketEntry> {
        self.buckets.iter().filter(|b| !b.removed)
    }
}

/// An entry that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBucket {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListBucketsOutcome {
    Complete(ListBucketsResult),
    Partial {
        result: ListBucketsResult,
        skipped: Vec<SkippedBucket>,
    },
}

impl ListBucketsOutcome {
    pub fn result(&self) -> &ListBucketsResult {
        match self {
            ListBucketsOutcome::Complete(result) => result,
            ListBucketsOutcome::Partial { result, .. } => result,
        }
    }

    pub fn into_result(self) -> ListBucketsResult {
        match self {
            ListBucketsOutcome::Complete(result) => result,
            ListBucketsOutcome::Partial { result, .. } => result,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ListBucketsOutcome::Complete(_))
    }
}

/// Decodes a listing body entry by entry.
pub fn decode_list_buckets(body: &[u8]) -> Result<ListBucketsOutcome> {
    let doc: Value = serde_json::from_slice(body).map_err(|e| Error::decode("bucket listing", e))?;
    let entries = doc
        .get("buckets")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::decode("bucket listing", "missing buckets array"))?;

    let mut buckets = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        match BucketEntry::deserialize(entry) {
            Ok(bucket) => buckets.push(bucket),
            Err(e) => skipped.push(SkippedBucket {
                index,
                reason: e.to_string(),
            }),
        }
    }

    let result = ListBucketsResult { buckets };
    if skipped.is_empty() {
        Ok(ListBucketsOutcome::Complete(result))
    } else {
        tracing::warn!(
            decoded = result.buckets.len(),
            skipped = skipped.len(),
            "bucket listing contained entries that could not be decoded"
        );
        Ok(ListBucketsOutcome::Partial { result, skipped })
    }
}

impl<C: HttpClient, M: ChainMetadata> SpClient<C, M> {
    /// Buckets owned by the signer's account.
    pub async fn list_buckets(&self, ctx: &CallContext) -> Result<ListBucketsOutcome> {
        let endpoint = self.resolver().in_service()?;
        let desc = RequestDescriptor::get();

        let response = self.send(ctx, &desc, &endpoint, SendOptions::buffered()).await?;
        let body = response.body.bytes().await?;
        decode_list_buckets(&body)
    }
}
