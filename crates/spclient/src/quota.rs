//! Read quota and read record queries.
//!
//! Both queries are bounded by the current calendar month in the local time
//! zone. The window is computed from local midnight on the first day of the
//! month up to local midnight on the first day of the next month, in
//! microseconds since the Unix epoch.

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone};
use serde::Deserialize;
use spclient_auth::{RequestDescriptor, check_bucket_name};
use spclient_route::{ChainMetadata, RouteKey};
use spclient_transport::{CallContext, HttpClient, SendOptions};
use thiserror::Error;

use crate::client::SpClient;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuotaError {
    #[error("invalid quota window start {start}: {reason}")]
    InvalidRange { start: i64, reason: &'static str },

    #[error("local midnight of {0} does not exist in this time zone")]
    NonexistentLocalMidnight(NaiveDate),
}

/// `[start_micros, end_micros]` with `0 <= start_micros <= end_micros`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaWindow {
    pub start_micros: i64,
    pub end_micros: i64,
}

/// Quota window of the current month on the local clock.
pub fn quota_window(explicit_start: Option<i64>) -> std::result::Result<QuotaWindow, QuotaError> {
    quota_window_at(Local::now(), explicit_start)
}

/// Quota window of the month containing `now`, in `now`'s time zone.
///
/// `None` and `Some(0)` both mean "from the start of the month".
pub fn quota_window_at<Tz: TimeZone>(
    now: DateTime<Tz>,
    explicit_start: Option<i64>,
) -> std::result::Result<QuotaWindow, QuotaError> {
    if let Some(start) = explicit_start {
        if start < 0 {
            return Err(QuotaError::InvalidRange {
                start,
                reason: "start is negative",
            });
        }
    }

    let tz = now.timezone();
    let today = now.date_naive();
    let first = today.with_day(1).unwrap_or(today);
    let next_first = first
        .checked_add_months(chrono::Months::new(1))
        .unwrap_or(NaiveDate::MAX);

    let month_start = local_midnight_micros(&tz, first)?;
    let end_micros = local_midnight_micros(&tz, next_first)?;

    let start_micros = match explicit_start {
        Some(start) if start > 0 => start,
        _ => month_start,
    };
    if start_micros > end_micros {
        return Err(QuotaError::InvalidRange {
            start: start_micros,
            reason: "start is after the end of the current month",
        });
    }

    Ok(QuotaWindow {
        start_micros,
        end_micros,
    })
}

/// Local midnight of `date`. Where a clock change skips midnight, the first
/// valid instant of the day (one hour later) is used.
fn local_midnight_micros<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> std::result::Result<i64, QuotaError> {
    [0, 1]
        .into_iter()
        .filter_map(|hour| date.and_hms_opt(hour, 0, 0))
        .find_map(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.timestamp_micros())
        .ok_or(QuotaError::NonexistentLocalMidnight(date))
}

/// `"YYYY-MM"` of the current local month.
pub fn year_month_label() -> String {
    year_month_label_at(&Local::now())
}

pub fn year_month_label_at<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    format!("{:04}-{:02}", now.year(), now.month())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListReadRecordOptions {
    /// Microseconds since the epoch; `None` or 0 starts at the beginning of the month.
    pub start_timestamp: Option<i64>,
    /// `None` or 0 asks for all records.
    pub max_records: Option<u32>,
}

/// Monthly read quota of a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename = "GetReadQuotaResult")]
pub struct QuotaInfo {
    #[serde(rename = "@version", default)]
    pub version: String,
    #[serde(rename = "BucketName", default)]
    pub bucket_name: String,
    #[serde(rename = "BucketID", default)]
    pub bucket_id: String,
    /// Charged quota bought on chain, in bytes.
    #[serde(rename = "ReadQuotaSize", default)]
    pub read_quota_size: u64,
    #[serde(rename = "SPFreeReadQuotaSize", default)]
    pub sp_free_read_quota_size: u64,
    #[serde(rename = "ReadConsumedSize", default)]
    pub read_consumed_size: u64,
}

impl QuotaInfo {
    /// Free plus charged quota not yet consumed.
    pub fn remaining(&self) -> u64 {
        self.read_quota_size
            .saturating_add(self.sp_free_read_quota_size)
            .saturating_sub(self.read_consumed_size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReadRecord {
    #[serde(rename = "ObjectName", default)]
    pub object_name: String,
    #[serde(rename = "ObjectID", default)]
    pub object_id: String,
    #[serde(rename = "ReadAccountAddress", default)]
    pub read_account_address: String,
    #[serde(rename = "ReadTimestampUs", default)]
    pub read_timestamp_us: i64,
    #[serde(rename = "ReadSize", default)]
    pub read_size: u64,
}

/// One page of a bucket's read records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename = "GetBucketReadQuotaResult")]
pub struct QuotaRecordInfo {
    #[serde(rename = "@version", default)]
    pub version: String,
    /// Start timestamp of the next page; 0 when the listing is complete.
    #[serde(rename = "NextStartTimestampUs", default)]
    pub next_start_timestamp_us: i64,
    #[serde(rename = "ReadRecord", default)]
    pub read_records: Vec<ReadRecord>,
}

impl<C: HttpClient, M: ChainMetadata> SpClient<C, M> {
    /// Read records of `bucket` for the current month.
    pub async fn list_bucket_read_record(
        &self,
        ctx: &CallContext,
        bucket: &str,
        opts: ListReadRecordOptions,
    ) -> Result<QuotaRecordInfo> {
        check_bucket_name(bucket).map_err(spclient_auth::AuthError::from)?;
        let window = quota_window(opts.start_timestamp)?;
        let max_records = match opts.max_records {
            Some(n) if n > 0 => n,
            _ => u32::MAX,
        };

        let desc = RequestDescriptor::get()
            .bucket(bucket)
            .query_flag("list-read-record")
            .query("max-records", max_records.to_string())
            .query("start-timestamp", window.start_micros.to_string())
            .query("end-timestamp", window.end_micros.to_string());

        let body = self.get_bucket_xml(ctx, bucket, &desc).await?;
        quick_xml::de::from_str(&body).map_err(|e| Error::decode("read records", e))
    }

    /// Read quota of `bucket` for the current month.
    pub async fn get_bucket_read_quota(&self, ctx: &CallContext, bucket: &str) -> Result<QuotaInfo> {
        check_bucket_name(bucket).map_err(spclient_auth::AuthError::from)?;

        let desc = RequestDescriptor::get()
            .bucket(bucket)
            .query_flag("read-quota")
            .query("year-month", year_month_label());

        let body = self.get_bucket_xml(ctx, bucket, &desc).await?;
        quick_xml::de::from_str(&body).map_err(|e| Error::decode("read quota", e))
    }

    async fn get_bucket_xml(
        &self,
        ctx: &CallContext,
        bucket: &str,
        desc: &RequestDescriptor,
    ) -> Result<String> {
        let endpoint = self.resolve_endpoint(RouteKey::BucketName(bucket)).await?;
        let response = self.send(ctx, desc, &endpoint, SendOptions::buffered()).await?;
        let bytes = response.body.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::decode("quota response", e))
    }
}
