use std::time::Duration;

use bytes::Bytes;
use spclient_auth::SignedRequest;

use crate::client::{HttpClient, RawResponse};
use crate::context::CallContext;
use crate::error::{Result, TransportError};
use crate::response::{Body, BodyStream, SpErrorBody, SpHeaders, SpResponse, read_all};
use crate::retry::RetryPolicy;

/// Whether the transport hands the body back open or reads it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyMode {
    /// The caller owns the open body and must drop or close it.
    Stream,
    /// The body is read fully and the connection released before returning.
    #[default]
    Buffered,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SendOptions {
    pub body_mode: BodyMode,
}

impl SendOptions {
    pub fn streaming() -> Self {
        Self {
            body_mode: BodyMode::Stream,
        }
    }

    pub fn buffered() -> Self {
        Self {
            body_mode: BodyMode::Buffered,
        }
    }
}

/// Sends signed requests with retry, per-call timeout and cancellation.
pub struct Transport<C> {
    client: C,
    policy: RetryPolicy,
    timeout: Duration,
}

impl<C: HttpClient> Transport<C> {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(client: C) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends `request`, retrying transient failures of safe methods.
    ///
    /// Non-2xx answers become [`TransportError::HttpStatus`] with the
    /// provider's error document when it has one.
    pub async fn send(
        &self,
        ctx: &CallContext,
        request: &SignedRequest,
        options: SendOptions,
    ) -> Result<SpResponse> {
        let max_attempts = if request.method.is_safe() {
            self.policy.max_attempts.max(1)
        } else {
            1
        };

        let mut attempt = 1;
        loop {
            let err = match self.attempt(ctx, request, options).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if attempt >= max_attempts || !err.is_retryable() {
                return Err(err);
            }

            let delay = self.policy.backoff_with_jitter(attempt - 1);
            tracing::warn!(
                method = %request.method,
                url = %request.url,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "storage provider request failed, retrying"
            );
            self.sleep(ctx, delay).await?;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        ctx: &CallContext,
        request: &SignedRequest,
        options: SendOptions,
    ) -> Result<SpResponse> {
        if ctx.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        let timeout = match ctx.remaining() {
            Some(remaining) if remaining.is_zero() => return Err(TransportError::DeadlineExceeded),
            Some(remaining) => self.timeout.min(remaining),
            None => self.timeout,
        };

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            timeout_ms = timeout.as_millis() as u64,
            "dispatching storage provider request"
        );

        let outcome = tokio::select! {
            biased;
            _ = ctx.cancel_token().cancelled() => return Err(TransportError::Cancelled),
            outcome = tokio::time::timeout(timeout, self.client.execute(request, timeout)) => outcome,
        };

        let raw = match outcome {
            Ok(Ok(raw)) => raw,
            Ok(Err(TransportError::Timeout { .. })) | Err(_) if ctx.deadline_passed() => {
                return Err(TransportError::DeadlineExceeded);
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(TransportError::Timeout {
                    url: request.url.to_string(),
                    timeout,
                });
            }
        };

        self.finish(ctx, request, raw, options).await
    }

    async fn finish(
        &self,
        ctx: &CallContext,
        request: &SignedRequest,
        raw: RawResponse,
        options: SendOptions,
    ) -> Result<SpResponse> {
        let RawResponse {
            status,
            headers,
            body,
        } = raw;
        let headers = SpHeaders::from_pairs(headers);

        if !(200..300).contains(&status) {
            let bytes = match self.read_cancellable(ctx, body).await {
                Ok(bytes) => bytes,
                Err(TransportError::Body { message, .. }) => {
                    tracing::debug!(
                        url = %request.url,
                        status,
                        error = %message,
                        "error response body unreadable"
                    );
                    Bytes::new()
                }
                Err(e) => return Err(e),
            };
            return Err(TransportError::HttpStatus {
                url: request.url.to_string(),
                status,
                error: SpErrorBody::parse(&bytes),
                body: String::from_utf8_lossy(&bytes).into_owned(),
                retryable: self.policy.retries_status(status),
            });
        }

        let body = match options.body_mode {
            BodyMode::Stream => Body::Stream(body),
            BodyMode::Buffered => Body::Buffered(self.read_cancellable(ctx, body).await?),
        };

        Ok(SpResponse {
            status,
            headers,
            body,
        })
    }

    async fn read_cancellable(&self, ctx: &CallContext, body: BodyStream) -> Result<Bytes> {
        tokio::select! {
            biased;
            _ = ctx.cancel_token().cancelled() => Err(TransportError::Cancelled),
            bytes = read_all(body) => bytes,
        }
    }

    async fn sleep(&self, ctx: &CallContext, delay: Duration) -> Result<()> {
        let delay = match ctx.remaining() {
            Some(remaining) => delay.min(remaining),
            None => delay,
        };
        tokio::select! {
            biased;
            _ = ctx.cancel_token().cancelled() => Err(TransportError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}
