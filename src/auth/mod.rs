//! OAuth2 client-credentials authentication for the Learn API.
//!
//! One [`TokenAuthority`] per client owns the shared access token. Callers
//! run [`TokenAuthority::ensure_token`] before every request; the authority
//! refreshes the token through the client-credentials grant only when the
//! cached one is no longer usable, and serializes concurrent refreshes so a
//! burst of callers produces a single token-endpoint call.

mod store;
mod token;

pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{Token, TokenResponse};

use crate::client::read_body_capped;
use crate::errors::{BlackboardError, BlackboardErrorKind, BlackboardResult};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Token-endpoint path on a Learn instance.
pub const TOKEN_ENDPOINT: &str = "/learn/api/public/v1/oauth2/token";

/// Immutable client id/secret pair for the client-credentials grant.
///
/// The pair is only ever transmitted as HTTP Basic auth on the token
/// exchange.
#[derive(Clone)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: SecretString,
}

impl ClientCredentials {
    /// Creates a credentials pair.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
        }
    }

    pub(crate) fn from_parts(client_id: String, client_secret: SecretString) -> Self {
        Self {
            client_id,
            client_secret,
        }
    }

    /// The client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Owns the shared access token and keeps it usable.
///
/// The token lives behind a read/write lock: the fast path takes a read lock
/// and returns without touching the network; the slow path holds the write
/// lock across the whole exchange, so at most one token request is in flight
/// per client instance and waiting callers observe its result.
pub struct TokenAuthority {
    credentials: ClientCredentials,
    token_url: String,
    http: reqwest::Client,
    store: Arc<dyn TokenStore>,
    token: RwLock<Option<Token>>,
}

impl TokenAuthority {
    /// Creates an authority with no token. Call [`Self::prime_from_store`]
    /// to pick up a previously cached token.
    pub fn new(
        credentials: ClientCredentials,
        base_url: &str,
        http: reqwest::Client,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let token_url = format!("{}{}", base_url.trim_end_matches('/'), TOKEN_ENDPOINT);
        Self {
            credentials,
            token_url,
            http,
            store,
            token: RwLock::new(None),
        }
    }

    /// Installs the cached token from the store, if one exists and is still
    /// usable. A missing or unreadable cache is a miss, never an error.
    pub async fn prime_from_store(&self) {
        let cached = match self.store.load().await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable token cache");
                None
            }
        };

        if let Some(token) = cached {
            if token.is_usable() {
                debug!("reusing cached access token");
                *self.token.write().await = Some(token);
            }
        }
    }

    /// Guarantees that the shared token is usable on successful return.
    ///
    /// Safe to call from unbounded concurrent callers: the usability check is
    /// repeated after the write lock is acquired, since another caller may
    /// have refreshed while this one waited.
    pub async fn ensure_token(&self) -> BlackboardResult<()> {
        {
            let guard = self.token.read().await;
            if guard.as_ref().is_some_and(Token::is_usable) {
                return Ok(());
            }
        }

        let mut guard = self.token.write().await;
        if guard.as_ref().is_some_and(Token::is_usable) {
            return Ok(());
        }

        debug!("requesting new access token");
        let token = self.exchange().await?;

        // The in-memory token alone is authoritative; a failed save must not
        // fail the request that triggered the refresh.
        if let Err(e) = self.store.save(&token).await {
            warn!(error = %e, "failed to persist refreshed token");
        }

        *guard = Some(token);
        Ok(())
    }

    /// Returns the current access token for header injection.
    pub async fn bearer_token(&self) -> BlackboardResult<String> {
        let guard = self.token.read().await;
        match guard.as_ref() {
            Some(token) => Ok(token.access_token.clone()),
            None => Err(BlackboardError::authentication("no access token available")),
        }
    }

    /// Performs the client-credentials exchange. The shared token is not
    /// touched here; the caller installs the result under the write lock.
    async fn exchange(&self) -> BlackboardResult<Token> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(
                self.credentials.client_id(),
                Some(self.credentials.client_secret()),
            )
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await
            .map_err(|e| {
                BlackboardError::authentication("token request failed").with_source(e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = read_body_capped(response).await;
            return Err(BlackboardError::authentication("token endpoint refused the exchange")
                .with_status(status.as_u16())
                .with_body(body));
        }

        let wire: TokenResponse = response.json().await.map_err(|e| {
            BlackboardError::authentication("failed to decode token response").with_source(e)
        })?;
        let token = Token::from_response(wire, chrono::Utc::now());

        if token.access_token.is_empty() {
            return Err(BlackboardError::new(
                BlackboardErrorKind::EmptyAccessToken,
                "token endpoint returned an empty access token",
            ));
        }

        Ok(token)
    }
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("credentials", &self.credentials)
            .field("token_url", &self.token_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let credentials = ClientCredentials::new("client-id", "very-secret");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("client-id"));
        assert!(!debug.contains("very-secret"));
    }

    #[tokio::test]
    async fn test_bearer_token_errors_when_absent() {
        let authority = TokenAuthority::new(
            ClientCredentials::new("id", "secret"),
            "https://learn.example.edu",
            reqwest::Client::new(),
            Arc::new(MemoryTokenStore::new()),
        );

        let err = authority.bearer_token().await.unwrap_err();
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_token_url_joins_base() {
        let authority = TokenAuthority::new(
            ClientCredentials::new("id", "secret"),
            "https://learn.example.edu/",
            reqwest::Client::new(),
            Arc::new(MemoryTokenStore::new()),
        );
        assert_eq!(
            authority.token_url,
            "https://learn.example.edu/learn/api/public/v1/oauth2/token"
        );
    }
}
