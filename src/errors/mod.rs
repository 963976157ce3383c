//! Error types for the Blackboard client.

use std::fmt;
use thiserror::Error;

/// Result type alias for Blackboard operations.
pub type BlackboardResult<T> = Result<T, BlackboardError>;

/// Error kinds for categorizing Blackboard errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlackboardErrorKind {
    // Configuration errors
    /// Client id, client secret, or base URL missing at construction.
    MissingCredentials,
    /// Base URL is empty or not a valid http(s) URL.
    InvalidBaseUrl,
    /// Any other invalid configuration.
    InvalidConfiguration,

    // Authentication errors
    /// The token exchange failed (non-200 status, transport error, or an
    /// undecodable response).
    AuthenticationFailed,
    /// The token endpoint returned 200 but the access token was empty.
    EmptyAccessToken,

    // Resource errors
    /// Resource not found (404).
    NotFound,
    /// Resource already exists (409, or the server's database-error quirk).
    AlreadyExists,
    /// The account lacks the privileges for the operation (403).
    InsufficientPrivileges,
    /// The request payload was rejected (400).
    ValidationError,

    // Network errors
    /// Connection failed.
    ConnectionFailed,
    /// Request timed out.
    Timeout,

    // Response errors
    /// Failed to deserialize a response body.
    DeserializationError,

    /// Unknown error.
    Unknown,
}

impl fmt::Display for BlackboardErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "missing_credentials"),
            Self::InvalidBaseUrl => write!(f, "invalid_base_url"),
            Self::InvalidConfiguration => write!(f, "invalid_configuration"),
            Self::AuthenticationFailed => write!(f, "authentication_failed"),
            Self::EmptyAccessToken => write!(f, "empty_access_token"),
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::InsufficientPrivileges => write!(f, "insufficient_privileges"),
            Self::ValidationError => write!(f, "validation_error"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DeserializationError => write!(f, "deserialization_error"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Blackboard API error with detailed information.
#[derive(Error, Debug)]
pub struct BlackboardError {
    /// Error kind.
    kind: BlackboardErrorKind,
    /// Error message.
    message: String,
    /// HTTP status code.
    status_code: Option<u16>,
    /// Response body (capped at [`crate::client::MAX_RESPONSE_SIZE`]).
    body: Option<String>,
    /// Underlying cause.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for BlackboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(code) = self.status_code {
            write!(f, " (HTTP {})", code)?;
        }
        if let Some(ref body) = self.body {
            write!(f, ": {}", body)?;
        }
        Ok(())
    }
}

impl BlackboardError {
    /// Creates a new Blackboard error.
    pub fn new(kind: BlackboardErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            body: None,
            source: None,
        }
    }

    /// Sets the HTTP status code.
    pub fn with_status(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Sets the response body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Gets the error kind.
    pub fn kind(&self) -> BlackboardErrorKind {
        self.kind
    }

    /// Gets the HTTP status code, if the error carries one.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Gets the response body, if the error carries one.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns true if this error came from the authentication layer.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self.kind,
            BlackboardErrorKind::AuthenticationFailed | BlackboardErrorKind::EmptyAccessToken
        )
    }

    /// Creates an error from an unexpected HTTP status and its (capped) body.
    pub fn from_response(status: u16, body: impl Into<String>) -> Self {
        let kind = Self::kind_from_status(status);
        Self::new(kind, format!("unexpected status {}", status))
            .with_status(status)
            .with_body(body)
    }

    /// Maps an HTTP status code to an error kind.
    fn kind_from_status(status: u16) -> BlackboardErrorKind {
        match status {
            400 => BlackboardErrorKind::ValidationError,
            403 => BlackboardErrorKind::InsufficientPrivileges,
            404 => BlackboardErrorKind::NotFound,
            409 => BlackboardErrorKind::AlreadyExists,
            _ => BlackboardErrorKind::Unknown,
        }
    }

    // Convenience constructors

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(BlackboardErrorKind::InvalidConfiguration, message)
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(BlackboardErrorKind::AuthenticationFailed, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(BlackboardErrorKind::NotFound, message).with_status(404)
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(BlackboardErrorKind::ValidationError, message)
    }

    /// Creates a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::new(BlackboardErrorKind::DeserializationError, message)
    }
}

impl From<reqwest::Error> for BlackboardError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            BlackboardErrorKind::Timeout
        } else if err.is_connect() {
            BlackboardErrorKind::ConnectionFailed
        } else {
            BlackboardErrorKind::Unknown
        };
        Self::new(kind, "HTTP request failed").with_source(err)
    }
}
