//! Client configuration for the Mistral SDK.

use crate::error::{Error, Result};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;
use url::Url;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "MISTRAL_API_KEY";
/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "MISTRAL_BASE_URL";

/// Configuration for the Mistral SDK client.
///
/// Immutable once built; the client shares it across concurrent calls.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API.
    pub(crate) base_url: Url,
    /// API key for authentication.
    pub(crate) api_key: Secret<String>,
    /// Per-request timeout duration.
    pub(crate) timeout: Duration,
    /// Connection timeout duration.
    pub(crate) connect_timeout: Duration,
    /// Maximum number of retry attempts after the first.
    pub(crate) max_retries: u32,
    /// User agent string.
    pub(crate) user_agent: String,
    /// Custom headers to include in every request.
    pub(crate) custom_headers: Vec<(String, String)>,
}

impl ClientConfig {
    /// Default API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.mistral.ai";
    /// Default per-request timeout (30 seconds).
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default connection timeout (10 seconds).
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default maximum retries.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    /// Default user agent.
    pub const DEFAULT_USER_AGENT: &'static str =
        concat!("mistral-sdk-rust/", env!("CARGO_PKG_VERSION"));

    /// Create a new configuration with default values.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::configuration("API key must not be empty"));
        }

        let base_url = Url::parse(Self::DEFAULT_BASE_URL)
            .map_err(|e| Error::configuration(format!("Invalid default base URL: {e}")))?;

        Ok(Self {
            base_url,
            api_key: Secret::new(api_key),
            timeout: Self::DEFAULT_TIMEOUT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            user_agent: Self::DEFAULT_USER_AGENT.to_string(),
            custom_headers: Vec::new(),
        })
    }

    /// Create a configuration from environment variables.
    ///
    /// Reads `MISTRAL_API_KEY` (required) and `MISTRAL_BASE_URL` (optional).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| Error::configuration(format!("{API_KEY_ENV} is not set")))?;

        let mut config = Self::new(api_key)?;
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.base_url = Url::parse(&base_url).map_err(|e| {
                Error::configuration(format!("Invalid {BASE_URL_ENV} '{base_url}': {e}"))
            })?;
        }
        Ok(config)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the API key (exposed for use in requests).
    pub(crate) fn api_key_value(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the connection timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Get the maximum number of retries.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Get the user agent.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Get custom headers.
    pub fn custom_headers(&self) -> &[(String, String)] {
        &self.custom_headers
    }
}
