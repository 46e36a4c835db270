//! Authentication error types.

use credential_storage::StorageError;
use std::fmt;
use thiserror::Error;

/// A `{message}` field from a backend error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// The message was a JSON string, shown verbatim.
    Text(String),
    /// The message was some other JSON value, kept as its JSON text.
    Structured(String),
}

impl ServerMessage {
    /// Extract the `message` field from a raw response body, if any.
    ///
    /// Blank strings, `null`, `false` and `0` count as no message.
    pub fn from_body(body: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        match value.get("message")? {
            serde_json::Value::Null | serde_json::Value::Bool(false) => None,
            serde_json::Value::Number(n) if n.as_f64() == Some(0.0) => None,
            serde_json::Value::String(text) if text.trim().is_empty() => None,
            serde_json::Value::String(text) => Some(Self::Text(text.clone())),
            other => Some(Self::Structured(other.to_string())),
        }
    }

    /// Text suitable for a notification.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Structured(text) => text,
        }
    }
}

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No response from the backend (connection, timeout, transport)
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// 401/403 rejection
    #[error("Unauthorized (HTTP {status})")]
    Unauthorized {
        status: u16,
        message: Option<ServerMessage>,
    },

    /// Response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Server-reported rejection of the submitted data (other 4xx)
    #[error("Request rejected (HTTP {status})")]
    ValidationFailure {
        status: u16,
        message: Option<ServerMessage>,
    },

    /// Backend failed while handling the request (5xx)
    #[error("Server error (HTTP {status})")]
    Server {
        status: u16,
        message: Option<ServerMessage>,
    },

    /// Credential storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Classify a non-success HTTP status and its body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = ServerMessage::from_body(body);
        match status {
            401 | 403 => AuthError::Unauthorized { status, message },
            400..=499 => AuthError::ValidationFailure { status, message },
            _ => AuthError::Server { status, message },
        }
    }

    /// The server-provided `{message}`, when the backend sent one.
    pub fn server_message(&self) -> Option<&ServerMessage> {
        match self {
            AuthError::Unauthorized { message, .. }
            | AuthError::ValidationFailure { message, .. }
            | AuthError::Server { message, .. } => message.as_ref(),
            _ => None,
        }
    }

    /// Returns true if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::NetworkFailure(_) => true,
            AuthError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            AuthError::MalformedResponse(error.to_string())
        } else {
            AuthError::NetworkFailure(error.to_string())
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

/// Why an identity fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    Network,
    Unauthorized,
    Malformed,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            FetchFailure::Network => "network",
            FetchFailure::Unauthorized => "unauthorized",
            FetchFailure::Malformed => "malformed",
        };
        f.write_str(reason)
    }
}

/// Failure of an identity fetcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} profile fetch failure: {detail}")]
pub struct FetchError {
    pub reason: FetchFailure,
    pub detail: String,
    pub server_message: Option<ServerMessage>,
}

impl FetchError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self {
            reason: FetchFailure::Malformed,
            detail: detail.into(),
            server_message: None,
        }
    }
}

impl From<AuthError> for FetchError {
    fn from(error: AuthError) -> Self {
        let reason = match &error {
            AuthError::Unauthorized { .. } | AuthError::ValidationFailure { .. } => {
                FetchFailure::Unauthorized
            }
            AuthError::MalformedResponse(_) => FetchFailure::Malformed,
            _ => FetchFailure::Network,
        };
        let server_message = error.server_message().cloned();

        Self {
            reason,
            detail: error.to_string(),
            server_message,
        }
    }
}
