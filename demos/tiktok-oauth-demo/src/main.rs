//! TikTok login demo
//!
//! `GET /auth/tiktok` sends the browser to TikTok's consent page and
//! `GET /auth/tiktok/callback` finishes the flow, answering with the verified
//! identity as JSON.

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use ras_identity_core::{IdentityResult, VerifiedIdentity, VerifyCallback};
use ras_identity_tiktok::{
    AuthenticateOptions, AuthenticateOutcome, AuthorizationResponse, InMemoryStateStore,
    OAuth2StateStore, TikTokError, TikTokProfile, TikTokStrategy,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::DemoConfig;

/// Accepts every TikTok profile and maps it to a [`VerifiedIdentity`].
struct IdentityVerifier;

#[async_trait]
impl VerifyCallback<TikTokProfile> for IdentityVerifier {
    type User = VerifiedIdentity;

    async fn verify(
        &self,
        _access_token: &str,
        _refresh_token: Option<&str>,
        profile: TikTokProfile,
    ) -> IdentityResult<Option<VerifiedIdentity>> {
        Ok(Some(VerifiedIdentity::from(&profile)))
    }
}

type Strategy = TikTokStrategy<IdentityVerifier>;

const STATE_CLEANUP_PERIOD: Duration = Duration::from_secs(60);

#[derive(Clone)]
struct AppState {
    strategy: Arc<Strategy>,
}

#[derive(Debug, Deserialize)]
struct LoginQuery {
    /// Comma separated scope override
    scope: Option<String>,
}

/// Strategy errors as HTTP responses.
struct AppError(TikTokError);

impl From<TikTokError> for AppError {
    fn from(err: TikTokError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TikTokError::OAuth2(_) => StatusCode::BAD_REQUEST,
            TikTokError::Transport(_)
            | TikTokError::MalformedResponse(_)
            | TikTokError::InvalidProfile(_) => StatusCode::BAD_GATEWAY,
            TikTokError::Configuration(_) | TikTokError::Verification(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error!("TikTok login failed: {}", self.0);
        (status, self.0.to_string()).into_response()
    }
}

fn outcome_response(outcome: AuthenticateOutcome<VerifiedIdentity>) -> Response {
    match outcome {
        AuthenticateOutcome::Redirect(redirect) => Redirect::to(&redirect.url).into_response(),
        AuthenticateOutcome::Success { user, .. } => {
            info!(subject = %user.subject, "TikTok login succeeded");
            Json(user).into_response()
        }
        AuthenticateOutcome::Failure { message } => {
            warn!("TikTok login rejected: {}", message);
            (StatusCode::UNAUTHORIZED, message).into_response()
        }
    }
}

async fn login_handler(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    let scope = query.scope.map(|scope| {
        scope
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    });

    let outcome = state
        .strategy
        .authenticate(AuthorizationResponse::default(), AuthenticateOptions { scope })
        .await?;
    Ok(outcome_response(outcome))
}

async fn callback_handler(
    State(state): State<AppState>,
    Query(callback): Query<AuthorizationResponse>,
) -> Result<Response, AppError> {
    info!("Handling TikTok callback");

    let outcome = state
        .strategy
        .authenticate(callback, AuthenticateOptions::default())
        .await?;
    Ok(outcome_response(outcome))
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Periodically drop login states whose flows were never completed.
fn spawn_state_cleanup(store: Arc<dyn OAuth2StateStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match store.cleanup_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "Pruned expired login states"),
                Err(err) => warn!("Failed to prune login states: {}", err),
            }
        }
    })
}

fn router(strategy: Arc<Strategy>) -> Router {
    Router::new()
        .route("/auth/tiktok", get(login_handler))
        .route("/auth/tiktok/callback", get(callback_handler))
        .route("/health", get(health_handler))
        .with_state(AppState { strategy })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let config = DemoConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting TikTok login demo");

    let state_store: Arc<dyn OAuth2StateStore> = Arc::new(InMemoryStateStore::new());
    let strategy =
        TikTokStrategy::with_state_store(config.tiktok.clone(), IdentityVerifier, state_store.clone())
            .context("Failed to configure TikTok strategy")?;
    spawn_state_cleanup(state_store, STATE_CLEANUP_PERIOD);
    info!(
        authorization_url = strategy.config().authorization_url(),
        scope = ?strategy.config().scope(),
        "TikTok strategy initialized"
    );

    let app = router(Arc::new(strategy));

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("Server running on http://{}", bind_addr);
    info!("TikTok callback URL: {}", config.tiktok.callback_url);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
