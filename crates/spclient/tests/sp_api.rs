//! End-to-end tests of the storage provider client against a wiremock server.
//!
//! | Method | Path                                   | Test |
//! |--------|----------------------------------------|------|
//! | GET    | `/greenfield/admin/v1/challenge`       | `challenge_*` |
//! | GET    | `/greenfield/admin/v1/get-approval`    | `approval_*` |
//! | GET    | `/{bucket}/?list-read-record`          | `read_records_*` |
//! | GET    | `/{bucket}/?read-quota`                | `read_quota_*` |
//! | GET    | `/`                                    | `list_buckets_*` |

mod common;

use bytes::Bytes;
use sha2::{Digest, Sha256};
use spclient::spclient_transport::TransportError;
use spclient::{
    ApprovalRequest, CallContext, ChallengeRequest, Error, ListBucketsOutcome,
    ListReadRecordOptions, quota_window, year_month_label,
};
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{addr, test_client};

// ── GET /greenfield/admin/v1/challenge ───────────────────────────────

#[tokio::test]
async fn challenge_returns_piece_and_hashes() {
    let server = MockServer::start().await;

    let pieces: [&[u8]; 3] = [b"piece-0", b"piece-1", b"piece-2"];
    let hashes: Vec<Vec<u8>> = pieces.iter().map(|p| Sha256::digest(p).to_vec()).collect();
    let integrity = hex::encode(Sha256::digest(hashes.concat()));
    let piece_header = hashes.iter().map(hex::encode).collect::<Vec<_>>().join(",");

    Mock::given(method("GET"))
        .and(path("/greenfield/admin/v1/challenge"))
        .and(query_param("object-id", "42"))
        .and(query_param("piece-index", "2"))
        .and(query_param("sp-address", addr(1).to_string()))
        .and(header_exists("authorization"))
        .and(header("x-gnfd-user-address", addr(0xaa).to_string().as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Gnfd-Integrity-Hash", integrity.as_str())
                .insert_header("X-Gnfd-Piece-Hash", piece_header.as_str())
                .set_body_bytes(b"piece-2".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let result = client
        .challenge(&CallContext::new(), &ChallengeRequest::new("42", 2, addr(1)))
        .await
        .unwrap();

    assert_eq!(result.piece_hashes.len(), 3);
    assert!(result.integrity_matches());
    assert_eq!(result.verify_piece(2).await.unwrap(), Bytes::from_static(b"piece-2"));
}

#[tokio::test]
async fn challenge_without_hash_headers_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/greenfield/admin/v1/challenge"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data".to_vec()))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let err = client
        .challenge(&CallContext::new(), &ChallengeRequest::new("42", 0, addr(1)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ChallengeResponseMalformed { .. }));
}

#[tokio::test]
async fn challenge_provider_error_document_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/greenfield/admin/v1/challenge"))
        .respond_with(ResponseTemplate::new(404).set_body_string(
            "<Error><Code>NoSuchObject</Code><Message>object not found</Message><RequestId>5</RequestId></Error>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let err = client
        .challenge(&CallContext::new(), &ChallengeRequest::new("42", 0, addr(1)))
        .await
        .unwrap_err();

    match err {
        Error::ChallengeCall { source, .. } => match *source {
            Error::Transport(TransportError::HttpStatus { status, error, .. }) => {
                assert_eq!(status, 404);
                assert_eq!(error.unwrap().code, "NoSuchObject");
            }
            other => panic!("unexpected source: {other:?}"),
        },
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn challenge_retries_unavailable_provider() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/greenfield/admin/v1/challenge"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/greenfield/admin/v1/challenge"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Gnfd-Integrity-Hash", "aa")
                .insert_header("X-Gnfd-Piece-Hash", "bb,cc"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let result = client
        .challenge(&CallContext::new(), &ChallengeRequest::new("42", 0, addr(1)))
        .await
        .unwrap();
    assert_eq!(result.piece_hashes, vec!["bb", "cc"]);
}

// ── GET /greenfield/admin/v1/get-approval ────────────────────────────

#[tokio::test]
async fn approval_returns_signed_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/greenfield/admin/v1/get-approval"))
        .and(query_param("action", "CreateObject"))
        .and(header("x-gnfd-unsigned-msg", "0102"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Gnfd-Signed-Msg", "cafe"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let signed = client
        .get_approval(
            &CallContext::new(),
            &ApprovalRequest {
                bucket_name: "photos".into(),
                object_name: Some("2024/cat.png".into()),
                primary_sp_address: addr(1),
                unsigned_msg: vec![1, 2],
            },
        )
        .await
        .unwrap();

    assert_eq!(signed, vec![0xca, 0xfe]);
}

// ── GET /{bucket}/?list-read-record ──────────────────────────────────

#[tokio::test]
async fn read_records_use_the_current_month_window() {
    let server = MockServer::start().await;
    let window = quota_window(None).unwrap();

    Mock::given(method("GET"))
        .and(path("/photos/"))
        .and(query_param("list-read-record", ""))
        .and(query_param("max-records", u32::MAX.to_string()))
        .and(query_param("start-timestamp", window.start_micros.to_string()))
        .and(query_param("end-timestamp", window.end_micros.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<GetBucketReadQuotaResult version="1.0">
                <NextStartTimestampUs>0</NextStartTimestampUs>
                <ReadRecord>
                    <ObjectName>cat.png</ObjectName>
                    <ObjectID>3</ObjectID>
                    <ReadAccountAddress>0x01</ReadAccountAddress>
                    <ReadTimestampUs>10</ReadTimestampUs>
                    <ReadSize>2048</ReadSize>
                </ReadRecord>
            </GetBucketReadQuotaResult>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let records = client
        .list_bucket_read_record(&CallContext::new(), "photos", ListReadRecordOptions::default())
        .await
        .unwrap();

    assert_eq!(records.read_records.len(), 1);
    assert_eq!(records.read_records[0].object_name, "cat.png");
    assert_eq!(records.read_records[0].read_size, 2048);
}

#[tokio::test]
async fn read_records_reject_invalid_start_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let err = client
        .list_bucket_read_record(
            &CallContext::new(),
            "photos",
            ListReadRecordOptions {
                start_timestamp: Some(-5),
                max_records: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Quota(_)));
}

// ── GET /{bucket}/?read-quota ────────────────────────────────────────

#[tokio::test]
async fn read_quota_queries_the_current_month() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/photos/"))
        .and(query_param("read-quota", ""))
        .and(query_param("year-month", year_month_label()))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<GetReadQuotaResult version="1.0"><BucketName>photos</BucketName><BucketID>7</BucketID><ReadQuotaSize>100</ReadQuotaSize><SPFreeReadQuotaSize>50</SPFreeReadQuotaSize><ReadConsumedSize>30</ReadConsumedSize></GetReadQuotaResult>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let quota = client
        .get_bucket_read_quota(&CallContext::new(), "photos")
        .await
        .unwrap();

    assert_eq!(quota.bucket_id, "7");
    assert_eq!(quota.remaining(), 120);
}

// ── GET / ────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_buckets_reports_partial_listing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "buckets": [
                {"bucket_info": {"bucket_name": "photos", "id": "7", "create_at": "1700000000"}, "removed": false},
                {"bucket_info": {"bucket_name": "broken"}, "removed": false}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let outcome = client.list_buckets(&CallContext::new()).await.unwrap();

    match outcome {
        ListBucketsOutcome::Partial { result, skipped } => {
            assert_eq!(result.buckets[0].bucket_info.bucket_name, "photos");
            assert_eq!(skipped.len(), 1);
            assert_eq!(skipped[0].index, 1);
        }
        other => panic!("expected partial listing, got {other:?}"),
    }
}

#[tokio::test]
async fn cancelled_call_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let ctx = CallContext::new();
    ctx.cancel();

    let err = client.list_buckets(&ctx).await.unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::Cancelled)));
}
