//! Blackboard API client and its authenticated request dispatcher.

use crate::auth::{ClientCredentials, FileTokenStore, TokenAuthority, TokenStore};
use crate::config::{BlackboardConfig, BlackboardConfigBuilder};
use crate::errors::{BlackboardError, BlackboardErrorKind, BlackboardResult};
use crate::services::{AnnouncementsService, CoursesService, UsersService};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Hard cap on response bodies read into memory.
pub const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

/// Header carrying the number of API calls left in the current window.
const RATE_LIMIT_REMAINING_HEADER: &str = "X-Rate-Limit-Remaining";

/// Blackboard Learn API client.
///
/// Every request goes through [`Self::send`], which guarantees a usable
/// access token before anything leaves the process. The raw response is
/// returned to the calling service, which owns interpreting status and body.
pub struct BlackboardClient {
    /// HTTP client.
    http: Client,
    /// Configuration.
    config: BlackboardConfig,
    /// Token authority.
    auth: Arc<TokenAuthority>,
}

impl BlackboardClient {
    /// Creates a new Blackboard client with a file-backed token cache at the
    /// configured path.
    pub async fn new(config: BlackboardConfig) -> BlackboardResult<Self> {
        let store = Arc::new(FileTokenStore::new(&config.token_cache_path));
        Self::with_store(config, store).await
    }

    /// Creates a client with a custom token store.
    pub async fn with_store(
        config: BlackboardConfig,
        store: Arc<dyn TokenStore>,
    ) -> BlackboardResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                BlackboardError::configuration("failed to build HTTP client").with_source(e)
            })?;

        let credentials =
            ClientCredentials::from_parts(config.client_id.clone(), config.client_secret.clone());
        let auth = Arc::new(TokenAuthority::new(
            credentials,
            &config.base_url,
            http.clone(),
            store,
        ));

        // Pick up a previously cached token so a restart does not cost an
        // exchange. A missing or stale cache is fine; the first request
        // refreshes lazily.
        auth.prime_from_store().await;

        Ok(Self { http, config, auth })
    }

    /// Creates a new client builder.
    pub fn builder() -> BlackboardClientBuilder {
        BlackboardClientBuilder::new()
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    // Service accessors

    /// Gets the users service.
    pub fn users(&self) -> UsersService<'_> {
        UsersService::new(self)
    }

    /// Gets the courses service.
    pub fn courses(&self) -> CoursesService<'_> {
        CoursesService::new(self)
    }

    /// Gets the announcements service.
    pub fn announcements(&self) -> AnnouncementsService<'_> {
        AnnouncementsService::new(self)
    }

    // HTTP methods

    /// Makes a GET request.
    pub async fn get(&self, path: &str) -> BlackboardResult<Response> {
        self.send(Method::GET, path, Option::<&()>::None).await
    }

    /// Makes a POST request with a JSON body.
    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> BlackboardResult<Response> {
        self.send(Method::POST, path, Some(body)).await
    }

    /// Makes a PUT request with a JSON body.
    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> BlackboardResult<Response> {
        self.send(Method::PUT, path, Some(body)).await
    }

    /// Makes a PUT request without a body.
    pub async fn put_empty(&self, path: &str) -> BlackboardResult<Response> {
        self.send(Method::PUT, path, Option::<&()>::None).await
    }

    /// Makes a PATCH request with a JSON body.
    pub async fn patch<B: Serialize>(&self, path: &str, body: &B) -> BlackboardResult<Response> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    /// Makes a DELETE request.
    pub async fn delete(&self, path: &str) -> BlackboardResult<Response> {
        self.send(Method::DELETE, path, Option::<&()>::None).await
    }

    /// Dispatches an authenticated request and returns the raw response.
    ///
    /// A usable token is guaranteed before the request leaves the process;
    /// when the token cannot be obtained, the typed authentication error is
    /// returned and nothing is sent. A token that expires between this check
    /// and the server evaluating it surfaces as the server's 401 — there is
    /// deliberately no retry here.
    pub async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> BlackboardResult<Response> {
        self.auth.ensure_token().await?;
        let token = self.auth.bearer_token().await?;

        tracing::debug!(%method, path, "dispatching authenticated request");

        let url = self.build_url(path);
        let mut request = self
            .http
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(BlackboardError::from)
    }

    /// Returns the number of API calls left in the current rate-limit
    /// window. Informational only — nothing in this client throttles on it.
    /// Note that the probe itself consumes a call.
    pub async fn remaining_calls(&self) -> BlackboardResult<u32> {
        let response = self.get("/learn/api/public/v1/users?limit=1").await?;

        let remaining = response
            .headers()
            .get(RATE_LIMIT_REMAINING_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                BlackboardError::new(
                    BlackboardErrorKind::Unknown,
                    format!("{} header not found", RATE_LIMIT_REMAINING_HEADER),
                )
            })?;

        remaining.parse().map_err(|e| {
            BlackboardError::deserialization("failed to parse remaining call count").with_source(e)
        })
    }

    fn build_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

/// Reads a response body as text, stopping at [`MAX_RESPONSE_SIZE`].
pub(crate) async fn read_body_capped(response: Response) -> String {
    let bytes = read_bytes_capped(response).await;
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Reads a response body as bytes, stopping at [`MAX_RESPONSE_SIZE`].
pub(crate) async fn read_bytes_capped(mut response: Response) -> Vec<u8> {
    let mut buf: Vec<u8> = Vec::new();
    while let Ok(Some(chunk)) = response.chunk().await {
        let remaining = MAX_RESPONSE_SIZE - buf.len();
        if chunk.len() >= remaining {
            buf.extend_from_slice(&chunk[..remaining]);
            break;
        }
        buf.extend_from_slice(&chunk);
    }
    buf
}

/// Decodes a JSON response body, reading at most [`MAX_RESPONSE_SIZE`].
pub(crate) async fn json_body<T: DeserializeOwned>(response: Response) -> BlackboardResult<T> {
    let bytes = read_bytes_capped(response).await;
    serde_json::from_slice(&bytes)
        .map_err(|e| BlackboardError::deserialization("failed to decode response").with_source(e))
}

/// Builder for [`BlackboardClient`].
pub struct BlackboardClientBuilder {
    config_builder: BlackboardConfigBuilder,
}

impl BlackboardClientBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config_builder: BlackboardConfig::builder(),
        }
    }

    /// Sets the Learn instance base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(url);
        self
    }

    /// Sets the OAuth2 client identifier.
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.client_id(id);
        self
    }

    /// Sets the OAuth2 client secret.
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.client_secret(secret);
        self
    }

    /// Sets the cached-credential file path.
    pub fn token_cache_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.config_builder = self.config_builder.token_cache_path(path);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.user_agent(ua);
        self
    }

    /// Builds the client.
    pub async fn build(self) -> BlackboardResult<BlackboardClient> {
        let config = self.config_builder.build()?;
        BlackboardClient::new(config).await
    }
}

impl Default for BlackboardClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
