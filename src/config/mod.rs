//! Configuration types for the Blackboard client.

use crate::errors::{BlackboardError, BlackboardErrorKind, BlackboardResult};
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default request timeout, matching the Learn API's recommended client settings.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default location of the cached-credential file.
pub const DEFAULT_TOKEN_CACHE_PATH: &str = "data/.token.json";

/// Default User-Agent header.
pub const DEFAULT_USER_AGENT: &str = "integrations-blackboard/0.1.0";

/// Blackboard client configuration.
///
/// Client id, client secret, and base URL come from the Blackboard Developer
/// Portal registration for the target Learn instance and are always required.
#[derive(Debug, Clone)]
pub struct BlackboardConfig {
    /// Learn instance base URL, e.g. `https://learn.example.edu`.
    pub base_url: String,
    /// OAuth2 client identifier.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: SecretString,
    /// Where the current token is cached between runs.
    pub token_cache_path: PathBuf,
    /// Request timeout applied to the token exchange and business calls.
    pub timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
}

impl BlackboardConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> BlackboardConfigBuilder {
        BlackboardConfigBuilder::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> BlackboardResult<()> {
        if self.client_id.is_empty() || self.client_secret.expose_secret().is_empty() {
            return Err(BlackboardError::new(
                BlackboardErrorKind::MissingCredentials,
                "client id and client secret are required",
            ));
        }

        if self.base_url.is_empty() {
            return Err(BlackboardError::new(
                BlackboardErrorKind::InvalidBaseUrl,
                "base URL cannot be empty",
            ));
        }

        let url = Url::parse(&self.base_url).map_err(|e| {
            BlackboardError::new(BlackboardErrorKind::InvalidBaseUrl, "base URL is not valid")
                .with_source(e)
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(BlackboardError::new(
                BlackboardErrorKind::InvalidBaseUrl,
                "base URL must use http or https",
            ));
        }

        Ok(())
    }
}

/// Builder for [`BlackboardConfig`].
#[derive(Debug, Default)]
pub struct BlackboardConfigBuilder {
    base_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    token_cache_path: Option<PathBuf>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl BlackboardConfigBuilder {
    /// Sets the Learn instance base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the OAuth2 client identifier.
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Sets the OAuth2 client secret.
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(secret.into()));
        self
    }

    /// Sets the cached-credential file path.
    pub fn token_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_cache_path = Some(path.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> BlackboardResult<BlackboardConfig> {
        let config = BlackboardConfig {
            base_url: self.base_url.unwrap_or_default(),
            client_id: self.client_id.unwrap_or_default(),
            client_secret: self
                .client_secret
                .unwrap_or_else(|| SecretString::new(String::new())),
            token_cache_path: self
                .token_cache_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_CACHE_PATH)),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };
        config.validate()?;
        Ok(config)
    }
}
