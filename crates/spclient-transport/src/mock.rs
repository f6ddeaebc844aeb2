//! Scripted [`HttpClient`] for tests.

use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use spclient_auth::SignedRequest;

use crate::client::{HttpClient, RawResponse};
use crate::error::{Result, TransportError};

/// One scripted outcome of [`MockHttpClient::execute`].
#[derive(Debug)]
pub enum MockReply {
    Response {
        status: u16,
        headers: Vec<(String, String)>,
        body: Bytes,
    },
    Error(TransportError),
    /// Never completes; used to exercise timeouts and cancellation.
    Hang,
    /// Status line arrives, body never finishes.
    StalledBody { status: u16 },
    /// Status line arrives, body read fails.
    BrokenBody { status: u16 },
}

impl MockReply {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::status(200).with_body(body)
    }

    pub fn status(status: u16) -> Self {
        MockReply::Response {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn stalled_body(status: u16) -> Self {
        MockReply::StalledBody { status }
    }

    pub fn broken_body(status: u16) -> Self {
        MockReply::BrokenBody { status }
    }

    pub fn connect_error() -> Self {
        MockReply::Error(TransportError::Connect {
            url: "mock".to_string(),
            message: "connection refused".to_string(),
        })
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let MockReply::Response { headers, .. } = &mut self {
            headers.push((name.to_string(), value.to_string()));
        }
        self
    }

    #[must_use]
    pub fn with_body(mut self, new_body: impl Into<Bytes>) -> Self {
        if let MockReply::Response { body, .. } = &mut self {
            *body = new_body.into();
        }
        self
    }
}

/// Replies from a script, in order, and records every request it sees.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    script: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<SignedRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let mock = Self::new();
        mock.script.lock().extend(replies);
        mock
    }

    pub fn push(&self, reply: MockReply) {
        self.script.lock().push_back(reply);
    }

    pub fn requests(&self) -> Vec<SignedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<SignedRequest> {
        self.requests.lock().last().cloned()
    }
}

impl HttpClient for MockHttpClient {
    async fn execute(&self, request: &SignedRequest, _timeout: Duration) -> Result<RawResponse> {
        self.requests.lock().push(request.clone());
        let reply = self.script.lock().pop_front();

        match reply {
            Some(MockReply::Response {
                status,
                headers,
                body,
            }) => Ok(RawResponse {
                status,
                headers,
                body: Box::pin(futures_util::stream::once(async move { Ok(body) })),
            }),
            Some(MockReply::Error(e)) => Err(e),
            Some(MockReply::Hang) => std::future::pending().await,
            Some(MockReply::StalledBody { status }) => Ok(RawResponse {
                status,
                headers: Vec::new(),
                body: Box::pin(futures_util::stream::pending::<Result<Bytes>>()),
            }),
            Some(MockReply::BrokenBody { status }) => {
                let err = TransportError::Body {
                    url: request.url.to_string(),
                    message: "connection reset".to_string(),
                };
                Ok(RawResponse {
                    status,
                    headers: Vec::new(),
                    body: Box::pin(futures_util::stream::once(async move { Err::<Bytes, _>(err) })),
                })
            }
            None => Err(TransportError::Request {
                url: request.url.to_string(),
                message: "mock script exhausted".to_string(),
            }),
        }
    }
}
