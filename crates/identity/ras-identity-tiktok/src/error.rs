//! TikTok strategy error types.

use ras_identity_core::IdentityError;
use ras_oauth2_engine::{InternalOAuthError, OAuth2Error};
use thiserror::Error;

pub type TikTokResult<T> = Result<T, TikTokError>;

#[derive(Debug, Error)]
pub enum TikTokError {
    /// Raised at construction; no strategy exists afterwards.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The profile request itself failed (network or non-2xx).
    #[error(transparent)]
    Transport(#[from] InternalOAuthError),

    #[error("Failed to parse user profile: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("Invalid TikTok response: {0}")]
    InvalidProfile(String),

    #[error("OAuth2 flow failed: {0}")]
    OAuth2(#[from] OAuth2Error),

    #[error("Verification failed: {0}")]
    Verification(#[from] IdentityError),
}
