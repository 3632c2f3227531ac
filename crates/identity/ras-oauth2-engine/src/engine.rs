//! Authorization Code flow driver.

use crate::config::OAuth2EngineConfig;
use crate::error::{OAuth2Error, OAuth2Result, TransportFailure};
use crate::params::ExtensionParams;
use crate::state::{OAuth2State, OAuth2StateStore};
use crate::types::{AuthorizationRedirect, AuthorizationResponse, TokenGrant, TokenResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Authenticated GET against a protected resource, returning the raw body.
///
/// Non-2xx answers are failures; the body is only returned on success.
#[async_trait]
pub trait AuthenticatedGet: Send + Sync {
    async fn get(&self, url: &str, access_token: &str) -> Result<String, TransportFailure>;
}

#[derive(Clone)]
pub struct OAuth2Engine {
    config: OAuth2EngineConfig,
    http_client: Client,
    state_store: Arc<dyn OAuth2StateStore>,
}

impl OAuth2Engine {
    pub fn new(
        config: OAuth2EngineConfig,
        state_store: Arc<dyn OAuth2StateStore>,
    ) -> OAuth2Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            http_client,
            state_store,
        })
    }

    pub fn config(&self) -> &OAuth2EngineConfig {
        &self.config
    }

    pub fn state_store(&self) -> &Arc<dyn OAuth2StateStore> {
        &self.state_store
    }

    /// Choose where GET requests carry the access token: the
    /// `Authorization` header (`true`) or the `access_token` query parameter.
    pub fn use_authorization_header_for_get(&mut self, enabled: bool) {
        self.config.auth_header_for_get = enabled;
    }

    /// Build the redirect to the provider's consent page and remember its state.
    ///
    /// `scopes` overrides the configured scopes for this flow only.
    pub async fn authorization_url(
        &self,
        extension: &dyn ExtensionParams,
        scopes: Option<&[String]>,
    ) -> OAuth2Result<AuthorizationRedirect> {
        let mut url = Url::parse(&self.config.authorization_endpoint)?;
        let scopes = scopes.unwrap_or(self.config.scopes.as_slice()).to_vec();

        let pending = OAuth2State::new(
            self.config.redirect_uri.clone(),
            scopes,
            self.config.state_ttl_seconds,
        );
        let state = pending.state.clone();

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("response_type", "code");
            query.append_pair("client_id", &self.config.client_id);
            query.append_pair("redirect_uri", &self.config.redirect_uri);
            if !pending.scopes.is_empty() {
                let scope = pending.scopes.join(self.config.scope_separator.as_str());
                query.append_pair("scope", &scope);
            }
            query.append_pair("state", &state);

            for (key, value) in extension.authorization_params() {
                query.append_pair(&key, &value);
            }
        }

        self.state_store.store(pending).await?;

        debug!(
            endpoint = %self.config.authorization_endpoint,
            "Generated authorization URL"
        );

        Ok(AuthorizationRedirect {
            url: url.to_string(),
            state,
        })
    }

    /// Validate the callback, consume its state and exchange the code.
    pub async fn handle_callback(
        &self,
        extension: &dyn ExtensionParams,
        response: AuthorizationResponse,
    ) -> OAuth2Result<TokenGrant> {
        let state_param = response.state.as_deref().ok_or(OAuth2Error::MissingState)?;
        let state = self.state_store.take(state_param).await?;

        if let Some(error) = &response.error {
            let description = response
                .error_description
                .as_deref()
                .unwrap_or("No description");
            return Err(OAuth2Error::CallbackError(format!(
                "{}: {}",
                error, description
            )));
        }

        let code = response
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or(OAuth2Error::MissingAuthorizationCode)?;

        let token = self.exchange_code(extension, code).await?;

        Ok(TokenGrant { token, state })
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        extension: &dyn ExtensionParams,
        code: &str,
    ) -> OAuth2Result<TokenResponse> {
        let mut form: Vec<(String, String)> = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("code".to_string(), code.to_string()),
            ("client_id".to_string(), self.config.client_id.clone()),
            ("client_secret".to_string(), self.config.client_secret.clone()),
            ("redirect_uri".to_string(), self.config.redirect_uri.clone()),
        ];
        form.extend(extension.token_params());

        let response = self
            .http_client
            .post(&self.config.token_endpoint)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(OAuth2Error::TokenExchangeFailed(format!(
                "{}: {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuth2Error::InvalidTokenResponse(e.to_string()))?;

        info!("Successfully exchanged code for tokens");
        Ok(token)
    }
}

#[async_trait]
impl AuthenticatedGet for OAuth2Engine {
    async fn get(&self, url: &str, access_token: &str) -> Result<String, TransportFailure> {
        let request = self.http_client.get(url);
        let request = if self.config.auth_header_for_get {
            request.bearer_auth(access_token)
        } else {
            request.query(&[("access_token", access_token)])
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TransportFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}
