//! HTTP client construction for the hosted backend.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use tracing::info;

use notevault_core::defaults::{HTTP_CONNECT_TIMEOUT_SECS, HTTP_TIMEOUT_SECS};
use notevault_core::{Error, Result};

/// HTTP client configuration options.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Total request timeout.
    pub timeout: Duration,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS),
            user_agent: format!("notevault/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Base URL and credentials of the hosted backend project.
#[derive(Debug, Clone)]
pub struct BackendEndpoint {
    /// Project URL without a trailing slash, e.g. `https://xyz.example.co`.
    pub base_url: String,
    /// Public (anon) API key.
    pub api_key: String,
    /// User access token; the API key is used as bearer when absent.
    pub access_token: Option<String>,
}

impl BackendEndpoint {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// `apikey` + `Authorization: Bearer` headers for every call.
    pub fn auth_headers(&self) -> Result<HeaderMap> {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| Error::Config(format!("invalid API key header: {}", e)))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer))
                .map_err(|e| Error::Config(format!("invalid bearer header: {}", e)))?,
        );
        Ok(headers)
    }
}

/// Create an HTTP client with default configuration.
pub fn create_client() -> Result<Client> {
    create_client_with_config(ClientConfig::default())
}

/// Create an HTTP client with custom configuration.
pub fn create_client_with_config(config: ClientConfig) -> Result<Client> {
    let start = Instant::now();

    info!(
        subsystem = "store",
        component = "http_client",
        op = "create",
        timeout_secs = config.timeout.as_secs(),
        connect_timeout_secs = config.connect_timeout.as_secs(),
        "Creating backend HTTP client"
    );

    let client = Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(config.user_agent)
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

    info!(
        subsystem = "store",
        component = "http_client",
        op = "established",
        duration_ms = start.elapsed().as_millis() as u64,
        "Backend HTTP client ready"
    );
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new()
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(2))
            .user_agent("test-agent");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let endpoint = BackendEndpoint::new("https://project.example.co/", "anon");
        assert_eq!(endpoint.base_url, "https://project.example.co");
    }

    #[test]
    fn test_auth_headers_prefer_access_token() {
        let endpoint = BackendEndpoint::new("https://p.example", "anon").with_access_token("jwt");
        let headers = endpoint.auth_headers().unwrap();
        assert_eq!(headers["apikey"], "anon");
        assert_eq!(headers[AUTHORIZATION], "Bearer jwt");

        let anon = BackendEndpoint::new("https://p.example", "anon");
        assert_eq!(anon.auth_headers().unwrap()[AUTHORIZATION], "Bearer anon");
    }

    #[test]
    fn test_auth_headers_reject_control_characters() {
        let endpoint = BackendEndpoint::new("https://p.example", "bad\nkey");
        assert!(matches!(endpoint.auth_headers(), Err(Error::Config(_))));
    }

    #[test]
    fn test_create_client() {
        assert!(create_client().is_ok());
    }
}
