//! Extension points for provider-specific request parameters.

use std::collections::BTreeMap;

/// Extra request parameters, kept ordered so generated URLs are stable.
pub type ExtraParams = BTreeMap<String, String>;

/// Implemented by provider strategies that need parameters beyond the
/// standard OAuth2 set. The engine appends them after its own parameters;
/// they never replace `client_id`, `redirect_uri`, `scope` or `state`.
pub trait ExtensionParams: Send + Sync {
    /// Merged into the authorization redirect query.
    fn authorization_params(&self) -> ExtraParams {
        ExtraParams::new()
    }

    /// Merged into the code-for-token request body.
    fn token_params(&self) -> ExtraParams {
        ExtraParams::new()
    }
}

/// For providers that follow the plain OAuth2 parameter set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtensionParams;

impl ExtensionParams for NoExtensionParams {}
