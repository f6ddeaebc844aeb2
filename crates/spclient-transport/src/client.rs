use std::future::Future;
use std::time::Duration;

use spclient_auth::SignedRequest;

use crate::error::Result;
use crate::response::BodyStream;

/// What an [`HttpClient`] hands back: status, raw headers and an open body.
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: BodyStream,
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations map their own failures onto
/// [`TransportError`](crate::TransportError): connection failures to
/// `Connect`, expired timeouts to `Timeout`, anything else to `Request`.
/// Non-2xx statuses are returned as responses, not errors.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - `mock::MockHttpClient` (feature `test-util`): scripted responses for tests
pub trait HttpClient: Send + Sync {
    fn execute(
        &self,
        request: &SignedRequest,
        timeout: Duration,
    ) -> impl Future<Output = Result<RawResponse>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use futures_util::StreamExt;
    use spclient_auth::Method;

    use super::*;
    use crate::error::TransportError;

    /// Production HTTP client implementation using reqwest.
    ///
    /// Cloning is cheap and clones share one connection pool.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> Result<Self> {
            let client = reqwest::Client::builder()
                .build()
                .map_err(|e| TransportError::Request {
                    url: String::new(),
                    message: e.to_string(),
                })?;
            Ok(Self { client })
        }

        pub fn from_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    fn method(m: Method) -> reqwest::Method {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }

    fn map_error(url: &str, timeout: Duration, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else if e.is_connect() {
            TransportError::Connect {
                url: url.to_string(),
                message: e.to_string(),
            }
        } else {
            TransportError::Request {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }

    impl HttpClient for ReqwestClient {
        async fn execute(&self, request: &SignedRequest, timeout: Duration) -> Result<RawResponse> {
            let url = request.url.as_str();
            let mut builder = self
                .client
                .request(method(request.method), url)
                .timeout(timeout);

            for (key, value) in &request.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }
            if !request.body.is_empty() {
                builder = builder.body(request.body.clone());
            }

            let response = builder
                .send()
                .await
                .map_err(|e| map_error(url, timeout, e))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| {
                    v.to_str()
                        .ok()
                        .map(|v| (k.as_str().to_string(), v.to_string()))
                })
                .collect();

            let body_url = url.to_string();
            let body = response.bytes_stream().map(move |chunk| {
                chunk.map_err(|e| TransportError::Body {
                    url: body_url.clone(),
                    message: e.to_string(),
                })
            });

            Ok(RawResponse {
                status,
                headers,
                body: Box::pin(body),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
