//! Access-token value type and the token-endpoint wire format.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lookahead window subtracted from a token's expiry when deciding usability,
/// so a token is renewed before it actually lapses mid-request.
const EXPIRY_MARGIN_MINUTES: i64 = 2;

/// Wire format of a successful token-endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Access token value.
    pub access_token: String,
    /// Token type, usually "bearer".
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Refresh token, if the server issued one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds as reported by the server.
    #[serde(default)]
    pub expires_in: i64,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// OAuth2 access token with its absolute expiry instant.
///
/// The expiry instant is computed client-side from the issue time plus the
/// server-reported lifetime, so a cached token stays meaningful across runs.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    /// Access token value.
    pub access_token: String,
    /// Token type, usually "bearer".
    pub token_type: String,
    /// Refresh token, if the server issued one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds as reported by the server.
    pub expires_in: i64,
    /// Absolute expiry instant.
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Builds a token from a token-endpoint response, stamping the expiry
    /// instant relative to `issued_at`.
    pub fn from_response(response: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        let expires_at = issued_at + Duration::seconds(response.expires_in);
        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
            expires_at,
        }
    }

    /// Returns true if the token can still be attached to a request at the
    /// given instant.
    ///
    /// A token with an empty access credential is never usable, regardless of
    /// its expiry instant.
    pub fn is_usable_at(&self, instant: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        instant + Duration::minutes(EXPIRY_MARGIN_MINUTES) < self.expires_at
    }

    /// Returns true if the token can still be attached to a request right now.
    ///
    /// Must be consulted immediately before every use of a cached token.
    pub fn is_usable(&self) -> bool {
        self.is_usable_at(Utc::now())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(access_token: &str, expires_in: i64) -> TokenResponse {
        TokenResponse {
            access_token: access_token.to_string(),
            token_type: "bearer".to_string(),
            refresh_token: None,
            expires_in,
        }
    }

    #[test]
    fn test_empty_access_token_never_usable() {
        let issued = Utc::now();
        let token = Token::from_response(response("", 3600), issued);
        assert!(!token.is_usable_at(issued));
        assert!(!token.is_usable());
    }

    #[test]
    fn test_usability_margin_boundary() {
        let issued = Utc::now();
        let token = Token::from_response(response("abc", 3600), issued);

        // Usable immediately and right up to the two-minute margin.
        assert!(token.is_usable_at(issued));
        assert!(token.is_usable_at(issued + Duration::minutes(57)));
        assert!(token.is_usable_at(issued + Duration::minutes(58) - Duration::seconds(1)));

        // Unusable once now + margin reaches the expiry instant.
        assert!(!token.is_usable_at(issued + Duration::minutes(58)));
        assert!(!token.is_usable_at(issued + Duration::minutes(59)));
        assert!(!token.is_usable_at(issued + Duration::minutes(61)));
    }

    #[test]
    fn test_expiry_computed_from_lifetime() {
        let issued = Utc::now();
        let token = Token::from_response(response("abc", 120), issued);
        assert_eq!(token.expires_at, issued + Duration::seconds(120));
        // Exactly at the margin already, so not usable.
        assert!(!token.is_usable_at(issued));
    }

    #[test]
    fn test_token_type_defaults_to_bearer() {
        let wire: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":3600}"#).unwrap();
        assert_eq!(wire.token_type, "bearer");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let issued = Utc::now();
        let mut token = Token::from_response(response("super-secret", 3600), issued);
        token.refresh_token = Some("refresh-secret".to_string());

        let debug = format!("{:?}", token);
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("refresh-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
