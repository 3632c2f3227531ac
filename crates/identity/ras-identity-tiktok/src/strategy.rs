//! The TikTok strategy: an OAuth2 engine configured with TikTok's extension
//! parameters, plus the profile step and the host's verify callback.

use crate::config::{TikTokConfig, TikTokStrategyOptions};
use crate::error::TikTokResult;
use crate::profile::{PROVIDER_NAME, ProfileFetcher, TikTokProfile};
use ras_identity_core::VerifyCallback;
use ras_oauth2_engine::{
    AuthorizationRedirect, AuthorizationResponse, ExtensionParams, ExtraParams,
    InMemoryStateStore, OAuth2Engine, OAuth2Error, OAuth2StateStore, TokenResponse,
};
use std::sync::Arc;
use tracing::{debug, info};

const ACCESS_DENIED: &str = "access_denied";

/// Per-request options for [`TikTokStrategy::authenticate`].
#[derive(Debug, Clone, Default)]
pub struct AuthenticateOptions {
    /// Scopes to request instead of the configured ones
    pub scope: Option<Vec<String>>,
}

/// What the host should do after an `authenticate` call.
#[derive(Debug)]
pub enum AuthenticateOutcome<U> {
    /// Send the user to TikTok's consent page.
    Redirect(AuthorizationRedirect),
    /// The verify callback accepted the profile.
    Success { user: U, tokens: TokenResponse },
    /// The user declined consent or the verify callback rejected the profile.
    Failure { message: String },
}

pub struct TikTokStrategy<V> {
    config: Arc<TikTokConfig>,
    engine: OAuth2Engine,
    verify: V,
}

impl<V> TikTokStrategy<V>
where
    V: VerifyCallback<TikTokProfile>,
{
    /// Build a strategy with an in-memory state store.
    pub fn new(options: TikTokStrategyOptions, verify: V) -> TikTokResult<Self> {
        Self::with_state_store(options, verify, Arc::new(InMemoryStateStore::new()))
    }

    pub fn with_state_store(
        options: TikTokStrategyOptions,
        verify: V,
        state_store: Arc<dyn OAuth2StateStore>,
    ) -> TikTokResult<Self> {
        let config = TikTokConfig::from_options(options)?;

        let mut engine = OAuth2Engine::new(config.engine_config(), state_store)?;
        engine.use_authorization_header_for_get(true);

        Ok(Self {
            config: Arc::new(config),
            engine,
            verify,
        })
    }

    pub fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    pub fn config(&self) -> &TikTokConfig {
        &self.config
    }

    pub fn engine(&self) -> &OAuth2Engine {
        &self.engine
    }

    /// Extra parameters for the authorization redirect.
    pub fn authorization_params(&self) -> ExtraParams {
        self.config.authorization_params()
    }

    /// Extra parameters for the token request.
    pub fn token_params(&self) -> ExtraParams {
        self.config.token_params()
    }

    /// Fetch and normalize the profile for `access_token`.
    pub async fn user_profile(
        &self,
        access_token: &str,
        granted_scopes: &[String],
    ) -> TikTokResult<TikTokProfile> {
        ProfileFetcher::new(&self.engine, self.config.profile_url())
            .fetch_profile(access_token, granted_scopes)
            .await
    }

    /// Drive one step of the login flow.
    ///
    /// Without callback parameters this starts the flow. With a `code` it
    /// finishes it: the code is exchanged, the profile fetched, and the
    /// verify callback decides the outcome.
    pub async fn authenticate(
        &self,
        request: AuthorizationResponse,
        options: AuthenticateOptions,
    ) -> TikTokResult<AuthenticateOutcome<V::User>> {
        if let Some(error) = request.error.as_deref() {
            if error == ACCESS_DENIED {
                let message = request
                    .error_description
                    .unwrap_or_else(|| "User denied access".to_string());
                info!("TikTok authorization denied by user");
                return Ok(AuthenticateOutcome::Failure { message });
            }
            let description = request.error_description.as_deref().unwrap_or("No description");
            return Err(OAuth2Error::CallbackError(format!("{}: {}", error, description)).into());
        }

        if request.code.is_none() {
            let redirect = self
                .engine
                .authorization_url(&*self.config, options.scope.as_deref())
                .await?;
            debug!("Redirecting to TikTok authorization");
            return Ok(AuthenticateOutcome::Redirect(redirect));
        }

        let grant = self
            .engine
            .handle_callback(&*self.config, request)
            .await?;
        let granted_scopes = grant.granted_scopes(self.config.scope_separator());

        let profile = self
            .user_profile(&grant.token.access_token, &granted_scopes)
            .await?;
        let open_id = profile.open_id().to_string();

        let user = self
            .verify
            .verify(
                &grant.token.access_token,
                grant.token.refresh_token.as_deref(),
                profile,
            )
            .await?;

        match user {
            Some(user) => {
                info!(open_id = %open_id, "TikTok authentication succeeded");
                Ok(AuthenticateOutcome::Success {
                    user,
                    tokens: grant.token,
                })
            }
            None => {
                info!(open_id = %open_id, "TikTok profile rejected by verify callback");
                Ok(AuthenticateOutcome::Failure {
                    message: "User verification failed".to_string(),
                })
            }
        }
    }
}
