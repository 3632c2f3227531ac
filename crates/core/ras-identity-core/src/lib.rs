//! Core identity types and the verification hook a host application plugs
//! into an identity strategy.
//!
//! A strategy (OAuth2 or otherwise) ends its work by handing a normalized
//! provider profile to a [`VerifyCallback`]. The host decides there whether the
//! profile maps to a local user, and the strategy reports that decision back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("User lookup failed: {0}")]
    UserLookupFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Provider-neutral view of an authenticated identity.
///
/// `subject` is the provider's durable user key and is what a host should use
/// to correlate a local account with the remote identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub provider_id: String,
    pub subject: String,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Host verification hook, invoked once per successful profile fetch.
///
/// Returning `Ok(None)` rejects the login without it being an error (the
/// strategy reports it as an authentication failure). Returning `Err` aborts
/// the attempt with that error.
#[async_trait]
pub trait VerifyCallback<P>: Send + Sync
where
    P: Send + 'static,
{
    type User: Send;

    async fn verify(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        profile: P,
    ) -> IdentityResult<Option<Self::User>>;
}

/// Accepts every profile and hands it back as the user.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptProfile;

#[async_trait]
impl<P> VerifyCallback<P> for AcceptProfile
where
    P: Send + 'static,
{
    type User = P;

    async fn verify(
        &self,
        _access_token: &str,
        _refresh_token: Option<&str>,
        profile: P,
    ) -> IdentityResult<Option<P>> {
        Ok(Some(profile))
    }
}

/// Adapts a synchronous closure into a [`VerifyCallback`].
pub struct FnVerifier<F> {
    f: F,
}

impl<F> FnVerifier<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<P, U, F> VerifyCallback<P> for FnVerifier<F>
where
    P: Send + 'static,
    U: Send,
    F: Fn(&str, Option<&str>, P) -> IdentityResult<Option<U>> + Send + Sync,
{
    type User = U;

    async fn verify(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        profile: P,
    ) -> IdentityResult<Option<U>> {
        (self.f)(access_token, refresh_token, profile)
    }
}
