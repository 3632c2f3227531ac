//! OAuth2 error types.

use thiserror::Error;

pub type OAuth2Result<T> = Result<T, OAuth2Error>;

#[derive(Debug, Error)]
pub enum OAuth2Error {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("State not found or expired")]
    StateNotFound,

    #[error("Missing state parameter")]
    MissingState,

    #[error("Missing authorization code")]
    MissingAuthorizationCode,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Callback error: {0}")]
    CallbackError(String),
}

/// Why an authenticated GET did not produce a body.
#[derive(Debug, Error)]
pub enum TransportFailure {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Wraps a transport failure with a message naming what the strategy was
/// trying to do.
#[derive(Debug, Error)]
#[error("{message}: {cause}")]
pub struct InternalOAuthError {
    message: String,
    #[source]
    cause: TransportFailure,
}

impl InternalOAuthError {
    pub fn new(message: impl Into<String>, cause: TransportFailure) -> Self {
        Self {
            message: message.into(),
            cause,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> &TransportFailure {
        &self.cause
    }

    /// HTTP status of the failed call, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match &self.cause {
            TransportFailure::Status { status, .. } => Some(*status),
            TransportFailure::Request(e) => e.status().map(|s| s.as_u16()),
        }
    }
}
