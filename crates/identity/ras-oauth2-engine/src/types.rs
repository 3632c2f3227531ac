//! OAuth2 protocol types.

use crate::state::OAuth2State;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Redirect produced at the start of a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRedirect {
    pub url: String,
    pub state: String,
}

/// Query parameters the provider sends back to the redirect URI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Token endpoint response.
///
/// Fields outside the standard set (for example a provider's own user id)
/// are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl TokenResponse {
    /// Scopes the provider says it granted, if it said anything.
    pub fn granted_scopes(&self, separator: &str) -> Option<Vec<String>> {
        let scope = self.scope.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let mut scopes: Vec<&str> = if separator.is_empty() {
            vec![scope]
        } else {
            scope.split(separator).collect()
        };
        // Providers do not always answer with the separator they were asked with
        if scopes.len() == 1 {
            scopes = scope
                .split(|c: char| c == ',' || c.is_whitespace())
                .collect();
        }
        Some(
            scopes
                .into_iter()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

/// Result of a completed callback: the tokens plus the flow they belong to.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub token: TokenResponse,
    pub state: OAuth2State,
}

impl TokenGrant {
    /// Granted scopes from the token response, falling back to the scopes
    /// requested for this flow.
    pub fn granted_scopes(&self, separator: &str) -> Vec<String> {
        self.token
            .granted_scopes(separator)
            .unwrap_or_else(|| self.state.scopes.clone())
    }
}
