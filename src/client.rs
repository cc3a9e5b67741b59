//! HTTP client and request pipeline for the Mistral SDK.

use crate::api;
use crate::config::ClientConfig;
use crate::error::{ApiErrorResponse, Error, Result};
use crate::request::{build_url, ApiRequest, RequestBody};
use crate::retry::RetryPolicy;
use crate::streaming::EventStream;
use crate::transport::{HttpTransport, Transport, TransportRequest, TransportResponse};
use bytes::Bytes;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Client for the Mistral AI platform API.
///
/// Immutable and cheap to clone; concurrent calls share no mutable state.
///
/// # Example
///
/// ```rust,no_run
/// use mistral_sdk::{ChatCompletionRequest, Client};
///
/// #[tokio::main]
/// async fn main() -> Result<(), mistral_sdk::Error> {
///     let client = Client::builder()
///         .api_key("your-api-key")
///         .build()?;
///
///     let request = ChatCompletionRequest::builder()
///         .model("mistral-small-latest")
///         .user_message("Hello!")
///         .build()?;
///
///     let response = client.chat().create(&request).await?;
///     println!("{}", response.content());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    default_headers: HeaderMap,
}

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client from `MISTRAL_API_KEY` / `MISTRAL_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Self::with_config(ClientConfig::from_env()?, None, None)
    }

    fn with_config(
        config: ClientConfig,
        transport: Option<Arc<dyn Transport>>,
        retry: Option<RetryPolicy>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(config.user_agent())
                .map_err(|e| Error::configuration(format!("Invalid user agent: {e}")))?,
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key_value()))
            .map_err(|e| Error::configuration(format!("Invalid API key: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        for (name, value) in config.custom_headers() {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| Error::configuration(format!("Invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                Error::configuration(format!("Invalid header value for '{name}': {e}"))
            })?;
            headers.insert(name, value);
        }

        let transport = match transport {
            Some(transport) => transport,
            None => Arc::new(
                HttpTransport::new(config.connect_timeout())
                    .map_err(|e| Error::configuration(e.to_string()))?,
            ),
        };

        let retry = retry.unwrap_or_else(|| RetryPolicy::new(config.max_retries()));

        Ok(Self {
            config: Arc::new(config),
            transport,
            retry,
            default_headers: headers,
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute a request and decode the response body as JSON.
    pub async fn execute<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let response = self.dispatch(request).await?;
        serde_json::from_slice(&response.body)
            .map_err(|e| Error::validation(format!("Malformed response body: {e}")))
    }

    /// Execute a request and return the response body unchanged.
    pub async fn execute_raw(&self, request: &ApiRequest) -> Result<Bytes> {
        let response = self.dispatch(request).await?;
        Ok(response.body)
    }

    /// Execute a streaming request and return the decoded event stream.
    pub async fn execute_stream(&self, request: &ApiRequest) -> Result<EventStream> {
        let prepared = self.prepare(request)?;
        let cancel = request
            .options
            .cancel
            .clone()
            .unwrap_or_else(CancellationToken::new);
        let mut retries_remaining = self.retry.max_retries();

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            debug!(method = %prepared.method, url = %prepared.url, "dispatching streaming request");

            match self.transport.send_streaming(prepared.clone()).await {
                Ok(response) if is_success(response.status) => {
                    return Ok(EventStream::new(response.frames, cancel));
                }
                Ok(response) => {
                    let status = response.status;
                    if RetryPolicy::is_retryable_status(status) && retries_remaining > 0 {
                        self.backoff(status, &cancel, retries_remaining).await?;
                        retries_remaining -= 1;
                        continue;
                    }
                    let headers = response.headers.clone();
                    let body = response.collect_body().await;
                    return Err(classify(status, &headers, &body, &request.path));
                }
                Err(e) => {
                    if retries_remaining > 0 {
                        self.backoff_transport(&e, &cancel, retries_remaining).await?;
                        retries_remaining -= 1;
                        continue;
                    }
                    return Err(Error::network(e.message, e.reason));
                }
            }
        }
    }

    /// Run one logical request to its terminal outcome, retries included.
    async fn dispatch(&self, request: &ApiRequest) -> Result<TransportResponse> {
        let prepared = self.prepare(request)?;
        let cancel = request
            .options
            .cancel
            .clone()
            .unwrap_or_else(CancellationToken::new);
        let mut retries_remaining = self.retry.max_retries();

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            debug!(method = %prepared.method, url = %prepared.url, "dispatching request");

            match self.transport.send(prepared.clone()).await {
                Ok(response) if is_success(response.status) => return Ok(response),
                Ok(response) => {
                    let status = response.status;
                    if RetryPolicy::is_retryable_status(status) && retries_remaining > 0 {
                        self.backoff(status, &cancel, retries_remaining).await?;
                        retries_remaining -= 1;
                        continue;
                    }
                    return Err(classify(
                        status,
                        &response.headers,
                        &response.body,
                        &request.path,
                    ));
                }
                Err(e) => {
                    if retries_remaining > 0 {
                        self.backoff_transport(&e, &cancel, retries_remaining).await?;
                        retries_remaining -= 1;
                        continue;
                    }
                    return Err(Error::network(e.message, e.reason));
                }
            }
        }
    }

    /// Resolve URL, headers and body for a logical request.
    fn prepare(&self, request: &ApiRequest) -> Result<TransportRequest> {
        let url = build_url(self.config.base_url(), &request.path, &request.options.params)?;

        let mut headers = self.default_headers.clone();
        for (name, value) in &request.options.headers {
            let header_name = HeaderName::try_from(name.as_str()).map_err(|e| {
                Error::validation_field(
                    format!("Invalid header name '{name}': {e}"),
                    name.clone(),
                    "must be a valid header name",
                )
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                Error::validation_field(
                    format!("Invalid header value for '{name}': {e}"),
                    name.clone(),
                    "must be a valid header value",
                )
            })?;
            headers.insert(header_name, header_value);
        }

        let body = match &request.body {
            None => None,
            Some(RequestBody::Raw(bytes)) => Some(bytes.clone()),
            Some(RequestBody::Json(value)) => Some(Bytes::from(
                serde_json::to_vec(value)
                    .map_err(|e| Error::validation(format!("Failed to serialize body: {e}")))?,
            )),
        };

        Ok(TransportRequest {
            method: request.method.clone(),
            url,
            headers,
            body,
            timeout: request.options.timeout.unwrap_or(self.config.timeout()),
        })
    }

    async fn backoff(
        &self,
        status: u16,
        cancel: &CancellationToken,
        retries_remaining: u32,
    ) -> Result<()> {
        let delay = self.retry.delay_for_remaining(retries_remaining);
        warn!(
            status,
            delay_ms = delay.as_millis() as u64,
            retries_remaining,
            "retrying after error status"
        );
        self.sleep(delay, cancel).await
    }

    async fn backoff_transport(
        &self,
        error: &crate::transport::TransportError,
        cancel: &CancellationToken,
        retries_remaining: u32,
    ) -> Result<()> {
        let delay = self.retry.delay_for_remaining(retries_remaining);
        warn!(
            error = %error,
            delay_ms = delay.as_millis() as u64,
            retries_remaining,
            "retrying after transport failure"
        );
        self.sleep(delay, cancel).await
    }

    async fn sleep(&self, delay: Duration, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }

    /// Chat completions.
    pub fn chat(&self) -> api::chat::Chat {
        api::chat::Chat::new(self.clone())
    }

    /// Embeddings.
    pub fn embeddings(&self) -> api::embeddings::Embeddings {
        api::embeddings::Embeddings::new(self.clone())
    }

    /// Model listing and management.
    pub fn models(&self) -> api::models::Models {
        api::models::Models::new(self.clone())
    }

    /// File management.
    pub fn files(&self) -> api::files::Files {
        api::files::Files::new(self.clone())
    }

    /// Fine-tuning jobs.
    pub fn fine_tuning(&self) -> api::fine_tuning::FineTuning {
        api::fine_tuning::FineTuning::new(self.clone())
    }

    /// Batch jobs.
    pub fn batch(&self) -> api::batch::Batch {
        api::batch::Batch::new(self.clone())
    }

    /// OCR processing.
    pub fn ocr(&self) -> api::ocr::Ocr {
        api::ocr::Ocr::new(self.clone())
    }

    /// Moderation and classification.
    pub fn moderations(&self) -> api::moderations::Moderations {
        api::moderations::Moderations::new(self.clone())
    }

    /// Beta agents and conversations.
    pub fn beta(&self) -> api::beta::Beta {
        api::beta::Beta::new(self.clone())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.base_url())
            .field("max_retries", &self.retry.max_retries())
            .finish_non_exhaustive()
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Map a terminal non-success response to its error kind.
///
/// Classification happens exactly once per logical request; retries never
/// reach this point unless the budget is exhausted.
fn classify(status: u16, headers: &HeaderMap, body: &[u8], path: &str) -> Error {
    let request_id = header_str(headers, "x-request-id");
    let body_text = String::from_utf8_lossy(body).into_owned();
    let parsed = serde_json::from_slice::<ApiErrorResponse>(body).ok();
    let fallback = if body_text.is_empty() {
        format!("HTTP {status}")
    } else {
        body_text.clone()
    };
    let message = parsed
        .as_ref()
        .map(|p| p.message_or(&fallback))
        .unwrap_or(fallback);

    match status {
        401 => Error::Authentication {
            message,
            request_id,
        },
        403 => Error::Permission {
            message,
            request_id,
        },
        404 => Error::NotFound {
            message,
            resource: Some(path.to_string()),
            request_id,
        },
        422 => validation_error(message, parsed.as_ref()),
        429 => Error::RateLimit {
            message,
            retry_after: header_str(headers, "retry-after").and_then(|v| v.parse().ok()),
            request_id,
        },
        500.. => Error::Server {
            message,
            status,
            request_id,
        },
        _ => Error::Api {
            message,
            status,
            body: body_text,
            request_id,
        },
    }
}

/// Build a validation error from a 422 body.
///
/// The API reports these as a `detail` list of `{loc, msg, type}` entries;
/// the first entry names the offending field and constraint.
fn validation_error(message: String, parsed: Option<&ApiErrorResponse>) -> Error {
    let first = parsed
        .and_then(|p| p.detail.as_ref())
        .and_then(|d| d.as_array())
        .and_then(|items| items.first());

    let Some(first) = first else {
        return Error::validation(message);
    };

    let message = first
        .get("msg")
        .and_then(serde_json::Value::as_str)
        .map(String::from)
        .unwrap_or(message);
    let field = first
        .get("loc")
        .and_then(serde_json::Value::as_array)
        .and_then(|loc| loc.last())
        .map(|v| v.as_str().map(String::from).unwrap_or_else(|| v.to_string()));
    let constraint = first
        .get("type")
        .and_then(serde_json::Value::as_str)
        .map(String::from);

    Error::Validation {
        message,
        field,
        constraint,
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    max_retries: Option<u32>,
    user_agent: Option<String>,
    custom_headers: Vec<(String, String)>,
    transport: Option<Arc<dyn Transport>>,
    retry_policy: Option<RetryPolicy>,
}

impl ClientBuilder {
    /// Create a new client builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key (required).
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum number of retries.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Add a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Inject a transport implementation.
    ///
    /// Tests use this to run the pipeline against canned responses.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Build the client.
    ///
    /// Fails with a configuration error when the API key is missing or the
    /// base URL does not parse.
    pub fn build(self) -> Result<Client> {
        let api_key = self
            .api_key
            .ok_or_else(|| Error::configuration("API key is required"))?;

        let mut config = ClientConfig::new(api_key)?;
        if let Some(base_url) = self.base_url {
            config.base_url = Url::parse(&base_url)
                .map_err(|e| Error::configuration(format!("Invalid base URL '{base_url}': {e}")))?;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(connect_timeout) = self.connect_timeout {
            config.connect_timeout = connect_timeout;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }
        config.custom_headers = self.custom_headers;

        Client::with_config(config, self.transport, self.retry_policy)
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers_with(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(
                HeaderName::try_from(*name).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        headers
    }

    #[test]
    fn test_builder_requires_api_key() {
        let err = Client::builder().build().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_builder_rejects_bad_base_url() {
        let err = Client::builder()
            .api_key("key")
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_builder_defaults() {
        let client = Client::builder().api_key("key").build().unwrap();
        assert_eq!(client.config().base_url().as_str(), "https://api.mistral.ai/");
        assert_eq!(client.retry.max_retries(), 3);
    }

    #[test]
    fn test_classify_authentication() {
        let err = classify(
            401,
            &headers_with(&[("x-request-id", "req-1")]),
            br#"{"message":"Unauthorized"}"#,
            "/models",
        );
        assert!(matches!(err, Error::Authentication { .. }));
        assert_eq!(err.request_id(), Some("req-1"));
    }

    #[test]
    fn test_classify_permission_and_not_found() {
        let err = classify(403, &HeaderMap::new(), b"", "/models");
        assert!(matches!(err, Error::Permission { .. }));

        let err = classify(404, &HeaderMap::new(), b"", "/models/x");
        assert!(matches!(err, Error::NotFound { resource: Some(r), .. } if r == "/models/x"));
    }

    #[test]
    fn test_classify_validation_detail() {
        let body = json!({
            "detail": [{
                "loc": ["body", "temperature"],
                "msg": "ensure this value is less than or equal to 1",
                "type": "value_error.number.not_le"
            }]
        });
        let err = classify(422, &HeaderMap::new(), body.to_string().as_bytes(), "/chat");
        match err {
            Error::Validation {
                field, constraint, ..
            } => {
                assert_eq!(field.as_deref(), Some("temperature"));
                assert_eq!(constraint.as_deref(), Some("value_error.number.not_le"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_rate_limit_retry_after() {
        let err = classify(
            429,
            &headers_with(&[("retry-after", "17")]),
            b"",
            "/chat/completions",
        );
        assert_eq!(err.retry_after(), Some(Duration::from_secs(17)));
    }

    #[test]
    fn test_classify_server_and_catch_all() {
        let err = classify(500, &HeaderMap::new(), b"boom", "/chat");
        assert!(matches!(err, Error::Server { status: 500, .. }));

        let err = classify(418, &HeaderMap::new(), b"teapot", "/chat");
        assert!(matches!(err, Error::Api { status: 418, .. }));
    }

    #[test]
    fn test_prepare_merges_headers() {
        let client = Client::builder()
            .api_key("key")
            .header("x-default", "base")
            .build()
            .unwrap();

        let request = ApiRequest::post("/files")
            .header("content-type", "multipart/form-data; boundary=abc")
            .header("x-extra", "yes");
        let prepared = client.prepare(&request).unwrap();

        assert_eq!(
            prepared.headers.get(CONTENT_TYPE).unwrap(),
            "multipart/form-data; boundary=abc"
        );
        assert_eq!(prepared.headers.get("x-default").unwrap(), "base");
        assert_eq!(prepared.headers.get("x-extra").unwrap(), "yes");
        assert!(prepared.headers.contains_key(AUTHORIZATION));
    }
}
