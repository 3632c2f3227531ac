//! Strategy configuration: option defaults, validation and the `client_key`
//! extension parameters.

use crate::error::{TikTokError, TikTokResult};
use ras_oauth2_engine::{ExtensionParams, ExtraParams, OAuth2EngineConfig};
use serde::{Deserialize, Serialize};

pub const DEFAULT_AUTHORIZATION_URL: &str = "https://www.tiktok.com/v2/auth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://open.tiktokapis.com/v2/oauth/token/";
pub const DEFAULT_PROFILE_URL: &str = "https://open.tiktokapis.com/v2/user/info/";
pub const DEFAULT_SCOPE_SEPARATOR: &str = ",";

/// Login Kit scope: open_id, avatar and display name.
pub const SCOPE_USER_INFO_BASIC: &str = "user.info.basic";
/// Adds profile details such as the username.
pub const SCOPE_USER_INFO_PROFILE: &str = "user.info.profile";

const CLIENT_KEY_PARAM: &str = "client_key";

/// Options as supplied by the host, before defaults are applied.
///
/// Empty strings count as omitted for the optional URL and separator fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TikTokStrategyOptions {
    pub client_id: String,
    pub client_secret: String,
    /// TikTok's application key, sent as `client_key`
    pub client_key: Option<String>,
    pub callback_url: String,
    pub authorization_url: Option<String>,
    pub token_url: Option<String>,
    pub profile_url: Option<String>,
    pub scope: Option<Vec<String>>,
    pub scope_separator: Option<String>,
    pub state_ttl_seconds: Option<u64>,
    pub http_timeout_seconds: Option<u64>,
}

impl TikTokStrategyOptions {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        client_key: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            client_key: Some(client_key.into()),
            callback_url: callback_url.into(),
            ..Default::default()
        }
    }

    pub fn with_authorization_url(mut self, url: impl Into<String>) -> Self {
        self.authorization_url = Some(url.into());
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    pub fn with_profile_url(mut self, url: impl Into<String>) -> Self {
        self.profile_url = Some(url.into());
        self
    }

    pub fn with_scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = Some(scope.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_scope_separator(mut self, separator: impl Into<String>) -> Self {
        self.scope_separator = Some(separator.into());
        self
    }
}

/// Validated, immutable strategy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TikTokConfig {
    client_id: String,
    client_secret: String,
    client_key: String,
    callback_url: String,
    authorization_url: String,
    token_url: String,
    profile_url: String,
    scope: Vec<String>,
    scope_separator: String,
    state_ttl_seconds: Option<u64>,
    http_timeout_seconds: Option<u64>,
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl TikTokConfig {
    /// Apply defaults and validate. Fails when `client_key` is missing or blank.
    pub fn from_options(options: TikTokStrategyOptions) -> TikTokResult<Self> {
        let client_key = options
            .client_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                TikTokError::Configuration("TikTokStrategy requires a client_key option".to_string())
            })?;

        Ok(Self {
            client_id: options.client_id,
            client_secret: options.client_secret,
            client_key,
            callback_url: options.callback_url,
            authorization_url: or_default(options.authorization_url, DEFAULT_AUTHORIZATION_URL),
            token_url: or_default(options.token_url, DEFAULT_TOKEN_URL),
            profile_url: or_default(options.profile_url, DEFAULT_PROFILE_URL),
            scope: options
                .scope
                .unwrap_or_else(|| vec![SCOPE_USER_INFO_BASIC.to_string()]),
            scope_separator: or_default(options.scope_separator, DEFAULT_SCOPE_SEPARATOR),
            state_ttl_seconds: options.state_ttl_seconds,
            http_timeout_seconds: options.http_timeout_seconds,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    pub fn authorization_url(&self) -> &str {
        &self.authorization_url
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn profile_url(&self) -> &str {
        &self.profile_url
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn scope_separator(&self) -> &str {
        &self.scope_separator
    }

    fn client_key_params(&self) -> ExtraParams {
        ExtraParams::from([(CLIENT_KEY_PARAM.to_string(), self.client_key.clone())])
    }

    /// Engine configuration for this strategy. GET requests carry the token
    /// in the `Authorization` header; TikTok rejects it as a query parameter.
    pub(crate) fn engine_config(&self) -> OAuth2EngineConfig {
        let mut config = OAuth2EngineConfig::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            self.authorization_url.clone(),
            self.token_url.clone(),
            self.callback_url.clone(),
        )
        .with_scopes(self.scope.clone())
        .with_scope_separator(self.scope_separator.clone());

        if let Some(ttl) = self.state_ttl_seconds {
            config = config.with_state_ttl(ttl);
        }
        if let Some(timeout) = self.http_timeout_seconds {
            config = config.with_http_timeout(timeout);
        }
        config
    }
}

impl ExtensionParams for TikTokConfig {
    fn authorization_params(&self) -> ExtraParams {
        self.client_key_params()
    }

    fn token_params(&self) -> ExtraParams {
        self.client_key_params()
    }
}
