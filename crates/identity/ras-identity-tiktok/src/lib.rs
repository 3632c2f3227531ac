//! TikTok identity strategy.
//!
//! Authenticates users through TikTok Login Kit using the OAuth2 Authorization
//! Code flow. TikTok needs its own `client_key` on both the authorization
//! redirect and the token request, and answers profile requests with a nested
//! `data.user` envelope whose fields depend on the granted scopes. This crate
//! injects the key through the engine's extension parameters and normalizes
//! the envelope into [`TikTokProfile`].

mod config;
mod error;
mod profile;
mod strategy;


pub use config::{
    DEFAULT_AUTHORIZATION_URL, DEFAULT_PROFILE_URL, DEFAULT_SCOPE_SEPARATOR, DEFAULT_TOKEN_URL,
    SCOPE_USER_INFO_BASIC, SCOPE_USER_INFO_PROFILE, TikTokConfig, TikTokStrategyOptions,
};
pub use error::{TikTokError, TikTokResult};
pub use profile::{
    BasicProfile, ExtendedProfile, PROVIDER_NAME, ProfileFetcher, TikTokProfile, profile_fields,
};
pub use strategy::{AuthenticateOptions, AuthenticateOutcome, TikTokStrategy};

// Re-export common types for convenience
pub use ras_identity_core::{AcceptProfile, FnVerifier, VerifiedIdentity, VerifyCallback};
pub use ras_oauth2_engine::{
    AuthorizationRedirect, AuthorizationResponse, InMemoryStateStore, OAuth2State, OAuth2StateStore,
    TokenResponse,
};
