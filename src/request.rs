//! Logical request types and URL construction.

use crate::error::{Error, Result};
use bytes::Bytes;
use reqwest::Method;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// API version prefix added to paths that do not already carry it.
pub const API_VERSION_PREFIX: &str = "/v1";

/// Body of a logical request.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// A JSON value, serialized to text before sending.
    Json(serde_json::Value),
    /// Raw bytes, sent unchanged (file uploads, multipart payloads).
    Raw(Bytes),
}

/// Per-call options carried by a logical request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters, appended to the URL and never to the body.
    pub params: Vec<(String, String)>,
    /// Header overrides; per-call values win over client defaults.
    pub headers: Vec<(String, String)>,
    /// Per-call timeout override.
    pub timeout: Option<Duration>,
    /// Cancellation token observed between attempts and between stream events.
    pub cancel: Option<CancellationToken>,
}

/// One logical API request.
///
/// Immutable once built; retries reuse the same value.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the API root, e.g. `/chat/completions`.
    pub path: String,
    /// Optional request body.
    pub body: Option<RequestBody>,
    /// Per-call options.
    pub options: RequestOptions,
}

impl ApiRequest {
    /// Create a request with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    /// Create a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Create a PATCH request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Create a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<T: serde::Serialize>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| Error::validation(format!("Failed to serialize body: {e}")))?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    /// Attach a raw byte body.
    pub fn raw_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(RequestBody::Raw(body.into()));
        self
    }

    /// Add a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.params.push((name.into(), value.into()));
        self
    }

    /// Add a header override.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.push((name.into(), value.into()));
        self
    }

    /// Set a per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Attach a cancellation token.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.options.cancel = Some(token);
        self
    }
}

/// Build the final URL for a request.
///
/// The base URL's trailing slash is trimmed, the `/v1` prefix is added
/// unless the path already starts with it, and query parameters are
/// appended url-encoded.
pub(crate) fn build_url(base_url: &Url, path: &str, params: &[(String, String)]) -> Result<Url> {
    let mut target = base_url.as_str().trim_end_matches('/').to_string();
    if !path.starts_with(API_VERSION_PREFIX) {
        target.push_str(API_VERSION_PREFIX);
    }
    target.push_str(path);

    let mut url = Url::parse(&target)
        .map_err(|e| Error::configuration(format!("Invalid request URL '{target}': {e}")))?;

    if !params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    Ok(url)
}
