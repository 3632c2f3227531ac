//! Generic OAuth2 Authorization Code engine.
//!
//! The engine builds authorization redirects, tracks the CSRF `state` value,
//! exchanges authorization codes for tokens and performs authenticated GET
//! requests against protected resources. It knows nothing about individual
//! providers: provider strategies plug in through [`ExtensionParams`], which
//! lets them merge extra parameters into the redirect and the token request.

mod config;
mod engine;
mod error;
mod params;
mod state;
mod types;


pub use config::OAuth2EngineConfig;
pub use engine::{AuthenticatedGet, OAuth2Engine};
pub use error::{InternalOAuthError, OAuth2Error, OAuth2Result, TransportFailure};
pub use params::{ExtensionParams, ExtraParams, NoExtensionParams};
pub use state::{InMemoryStateStore, OAuth2State, OAuth2StateStore};
pub use types::{AuthorizationRedirect, AuthorizationResponse, TokenGrant, TokenResponse};
