//! Transport abstraction over the HTTP layer.
//!
//! The request pipeline talks to the network only through [`Transport`],
//! which keeps the pipeline and the SSE decoder testable with canned
//! responses. [`HttpTransport`] is the reqwest-backed implementation.

use crate::error::NetworkReason;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::HeaderMap;
use reqwest::Method;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A transport-level failure: no HTTP response was produced.
#[derive(Debug, Clone, Error)]
#[error("transport error ({reason}): {message}")]
pub struct TransportError {
    /// What part of the exchange failed.
    pub reason: NetworkReason,
    /// Description of the failure.
    pub message: String,
}

impl TransportError {
    /// Create a transport error.
    pub fn new(reason: NetworkReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// One fully-resolved HTTP request, ready to send.
///
/// The pipeline resolves URL, headers and body before handing the request
/// to the transport; retries reuse the same value.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Final URL, query string included.
    pub url: Url,
    /// Complete header set (defaults already merged with overrides).
    pub headers: HeaderMap,
    /// Serialized body, if any.
    pub body: Option<Bytes>,
    /// Bound on this attempt.
    pub timeout: Duration,
}

/// A buffered HTTP response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

/// An HTTP response whose body arrives as a lazy sequence of byte frames.
pub struct StreamingResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body frames, produced as they arrive on the wire.
    pub frames: BoxStream<'static, Result<Bytes, TransportError>>,
}

impl StreamingResponse {
    /// Drain the remaining frames into one buffer.
    ///
    /// Used to recover an error body from a streaming call that failed
    /// before any events were produced.
    pub async fn collect_body(mut self) -> Bytes {
        let mut buf = Vec::new();
        while let Some(Ok(frame)) = self.frames.next().await {
            buf.extend_from_slice(&frame);
        }
        Bytes::from(buf)
    }
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// The network capability the request pipeline depends on.
///
/// Implementations perform exactly one exchange per call; retry policy,
/// classification and decoding live in the pipeline, not here.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and buffer the full response.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;

    /// Send one request and expose the response body as raw frames.
    async fn send_streaming(
        &self,
        request: TransportRequest,
    ) -> Result<StreamingResponse, TransportError>;
}

/// Transport implementation backed by [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the given connection timeout.
    pub fn new(connect_timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| {
                TransportError::new(
                    NetworkReason::Request,
                    format!("failed to create HTTP client: {e}"),
                )
            })?;
        Ok(Self { http })
    }

    fn build(&self, request: TransportRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers)
            .timeout(request.timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let response = self
            .build(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            TransportError::new(NetworkReason::Body, format!("failed to read body: {e}"))
        })?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    async fn send_streaming(
        &self,
        request: TransportRequest,
    ) -> Result<StreamingResponse, TransportError> {
        let response = self
            .build(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let frames = response
            .bytes_stream()
            .map_err(|e| {
                TransportError::new(NetworkReason::Body, format!("stream read failed: {e}"))
            })
            .boxed();

        Ok(StreamingResponse {
            status,
            headers,
            frames,
        })
    }
}

/// Map a reqwest error to a transport error with a reason tag.
fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    let reason = if error.is_timeout() {
        NetworkReason::Timeout
    } else if error.is_connect() {
        NetworkReason::Connect
    } else if error.is_body() || error.is_decode() {
        NetworkReason::Body
    } else {
        NetworkReason::Request
    };
    TransportError::new(reason, error.to_string())
}
