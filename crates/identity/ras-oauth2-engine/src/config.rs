//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a single OAuth2 client registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2EngineConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Joins `scopes` into the `scope` query parameter
    pub scope_separator: String,
    /// Send the access token as `Authorization: Bearer` on GET requests
    /// instead of as an `access_token` query parameter
    pub auth_header_for_get: bool,
    pub state_ttl_seconds: u64,
    pub http_timeout_seconds: u64,
}

impl OAuth2EngineConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            redirect_uri: redirect_uri.into(),
            scopes: Vec::new(),
            scope_separator: " ".to_string(),
            auth_header_for_get: false,
            state_ttl_seconds: 600, // 10 minutes
            http_timeout_seconds: 30,
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_scope_separator(mut self, separator: impl Into<String>) -> Self {
        self.scope_separator = separator.into();
        self
    }

    pub fn with_state_ttl(mut self, seconds: u64) -> Self {
        self.state_ttl_seconds = seconds;
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = seconds;
        self
    }
}
