//! Profile request and normalization.
//!
//! TikTok returns `{ "data": { "user": { ... } }, "error": { ... } }` from the
//! user info endpoint. Which user fields are present depends on the scopes the
//! user granted, so the normalized profile is a sum type: [`BasicProfile`]
//! for Login Kit basics, [`ExtendedProfile`] when profile details (currently
//! the username) were both granted and returned.

use crate::config::SCOPE_USER_INFO_PROFILE;
use crate::error::{TikTokError, TikTokResult};
use ras_identity_core::VerifiedIdentity;
use ras_oauth2_engine::{AuthenticatedGet, InternalOAuthError};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const PROVIDER_NAME: &str = "tiktok";

const BASIC_FIELDS: &str = "open_id,avatar_url,display_name";
const PROFILE_FIELDS: &str = "open_id,avatar_url,display_name,username";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicProfile {
    pub provider: &'static str,
    /// TikTok's per-application user id, copied verbatim
    pub open_id: String,
    pub display_name: String,
    pub avatar_url: String,
    /// Response body as received
    #[serde(rename = "_raw")]
    pub raw: String,
    /// Parsed response envelope
    #[serde(rename = "_json")]
    pub json: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendedProfile {
    #[serde(flatten)]
    pub basic: BasicProfile,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TikTokProfile {
    Basic(BasicProfile),
    Extended(ExtendedProfile),
}

impl TikTokProfile {
    pub fn basic(&self) -> &BasicProfile {
        match self {
            TikTokProfile::Basic(basic) => basic,
            TikTokProfile::Extended(extended) => &extended.basic,
        }
    }

    pub fn provider(&self) -> &'static str {
        self.basic().provider
    }

    pub fn open_id(&self) -> &str {
        &self.basic().open_id
    }

    pub fn display_name(&self) -> &str {
        &self.basic().display_name
    }

    pub fn avatar_url(&self) -> &str {
        &self.basic().avatar_url
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            TikTokProfile::Basic(_) => None,
            TikTokProfile::Extended(extended) => Some(&extended.username),
        }
    }

    pub fn raw(&self) -> &str {
        &self.basic().raw
    }

    pub fn json(&self) -> &serde_json::Value {
        &self.basic().json
    }

    pub fn is_extended(&self) -> bool {
        matches!(self, TikTokProfile::Extended(_))
    }
}

impl From<&TikTokProfile> for VerifiedIdentity {
    fn from(profile: &TikTokProfile) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

        VerifiedIdentity {
            provider_id: profile.provider().to_string(),
            subject: profile.open_id().to_string(),
            display_name: non_empty(profile.display_name()),
            username: profile.username().map(str::to_string),
            avatar_url: non_empty(profile.avatar_url()),
            metadata: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    #[serde(default)]
    open_id: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn has_profile_scope(granted_scopes: &[String]) -> bool {
    granted_scopes.iter().any(|s| s == SCOPE_USER_INFO_PROFILE)
}

/// Fields to request for the granted scopes.
pub fn profile_fields(granted_scopes: &[String]) -> &'static str {
    if has_profile_scope(granted_scopes) {
        PROFILE_FIELDS
    } else {
        BASIC_FIELDS
    }
}

fn profile_request_url(profile_url: &str, granted_scopes: &[String]) -> String {
    let separator = if profile_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}fields={}",
        profile_url,
        separator,
        profile_fields(granted_scopes)
    )
}

/// The provider's own error report, if it sent a non-`ok` one.
fn provider_error(json: &serde_json::Value) -> Option<String> {
    let error: ApiError = serde_json::from_value(json.get("error")?.clone()).ok()?;
    let code = error.code.filter(|code| code != "ok")?;
    Some(match error.message.filter(|m| !m.is_empty()) {
        Some(message) => format!("{} ({})", code, message),
        None => code,
    })
}

/// Validate a profile response body and map it to a normalized profile.
pub(crate) fn normalize_profile(
    body: String,
    granted_scopes: &[String],
) -> TikTokResult<TikTokProfile> {
    let json: serde_json::Value =
        serde_json::from_str(&body).map_err(TikTokError::MalformedResponse)?;

    let user = match json.pointer("/data/user") {
        Some(user) if !user.is_null() => user,
        _ => {
            let message = match provider_error(&json) {
                Some(error) => format!("missing user data: {}", error),
                None => "missing user data".to_string(),
            };
            return Err(TikTokError::InvalidProfile(message));
        }
    };

    // A record is required; serde would also accept a positional array
    if !user.is_object() {
        return Err(TikTokError::InvalidProfile("missing open_id".to_string()));
    }

    let user: UserRecord =
        serde_json::from_value(user.clone()).map_err(TikTokError::MalformedResponse)?;

    let open_id = user
        .open_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| TikTokError::InvalidProfile("missing open_id".to_string()))?;

    let basic = BasicProfile {
        provider: PROVIDER_NAME,
        open_id,
        display_name: user.display_name.unwrap_or_default(),
        avatar_url: user.avatar_url.unwrap_or_default(),
        raw: body,
        json,
    };

    let username = user
        .username
        .filter(|name| !name.is_empty() && has_profile_scope(granted_scopes));

    Ok(match username {
        Some(username) => TikTokProfile::Extended(ExtendedProfile { basic, username }),
        None => TikTokProfile::Basic(basic),
    })
}

/// Fetches and normalizes the user profile with one authenticated request.
pub struct ProfileFetcher<'a, T: ?Sized> {
    transport: &'a T,
    profile_url: &'a str,
}

impl<'a, T> ProfileFetcher<'a, T>
where
    T: AuthenticatedGet + ?Sized,
{
    pub fn new(transport: &'a T, profile_url: &'a str) -> Self {
        Self {
            transport,
            profile_url,
        }
    }

    pub async fn fetch_profile(
        &self,
        access_token: &str,
        granted_scopes: &[String],
    ) -> TikTokResult<TikTokProfile> {
        let url = profile_request_url(self.profile_url, granted_scopes);

        let body = self
            .transport
            .get(&url, access_token)
            .await
            .map_err(|cause| InternalOAuthError::new("Failed to fetch user profile", cause))?;

        let profile = normalize_profile(body, granted_scopes)?;
        debug!(
            extended = profile.is_extended(),
            "Normalized TikTok user profile"
        );
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn envelope(user: serde_json::Value) -> String {
        serde_json::json!({
            "data": { "user": user },
            "error": { "code": "ok", "message": "", "log_id": "20231011" }
        })
        .to_string()
    }

    #[test]
    fn test_field_selection() {
        assert_eq!(
            profile_fields(&scopes(&["user.info.basic"])),
            "open_id,avatar_url,display_name"
        );
        assert_eq!(
            profile_fields(&scopes(&["user.info.basic", "user.info.profile"])),
            "open_id,avatar_url,display_name,username"
        );
    }

    #[test]
    fn test_request_url_appends_fields() {
        assert_eq!(
            profile_request_url(
                "https://open.tiktokapis.com/v2/user/info/",
                &scopes(&["user.info.basic"])
            ),
            "https://open.tiktokapis.com/v2/user/info/?fields=open_id,avatar_url,display_name"
        );
        assert_eq!(
            profile_request_url("http://localhost/info?v=2", &scopes(&[])),
            "http://localhost/info?v=2&fields=open_id,avatar_url,display_name"
        );
    }

    #[test]
    fn test_basic_profile_without_username() {
        let body = envelope(serde_json::json!({
            "open_id": "123",
            "display_name": "Alice",
            "avatar_url": "http://x/a.png"
        }));

        let profile = normalize_profile(body.clone(), &scopes(&["user.info.basic"])).unwrap();
        match &profile {
            TikTokProfile::Basic(basic) => {
                assert_eq!(basic.provider, "tiktok");
                assert_eq!(basic.open_id, "123");
                assert_eq!(basic.display_name, "Alice");
                assert_eq!(basic.avatar_url, "http://x/a.png");
                assert_eq!(basic.raw, body);
                assert_eq!(basic.json["data"]["user"]["open_id"], "123");
            }
            other => panic!("Expected basic profile, got {:?}", other),
        }
        assert_eq!(profile.username(), None);
    }

    #[test]
    fn test_extended_profile_with_scope_and_username() {
        let body = envelope(serde_json::json!({
            "open_id": "123",
            "username": "alice99",
            "display_name": "Alice",
            "avatar_url": "http://x/a.png"
        }));

        let profile =
            normalize_profile(body, &scopes(&["user.info.basic", "user.info.profile"])).unwrap();
        assert!(profile.is_extended());
        assert_eq!(profile.username(), Some("alice99"));
        assert_eq!(profile.open_id(), "123");
    }

    #[test]
    fn test_username_dropped_without_profile_scope() {
        let body = envelope(serde_json::json!({
            "open_id": "123",
            "username": "alice99",
            "display_name": "Alice",
            "avatar_url": "http://x/a.png"
        }));

        let profile = normalize_profile(body, &scopes(&["user.info.basic"])).unwrap();
        assert!(matches!(profile, TikTokProfile::Basic(_)));
        assert_eq!(profile.username(), None);
    }

    #[test]
    fn test_scope_without_username_downgrades_to_basic() {
        for user in [
            serde_json::json!({ "open_id": "123", "display_name": "Alice", "avatar_url": "" }),
            serde_json::json!({ "open_id": "123", "username": "", "display_name": "Alice" }),
            serde_json::json!({ "open_id": "123", "username": null }),
        ] {
            let profile =
                normalize_profile(envelope(user), &scopes(&["user.info.profile"])).unwrap();
            assert!(matches!(profile, TikTokProfile::Basic(_)));
        }
    }

    #[test]
    fn test_not_json_is_malformed() {
        let result = normalize_profile("<html>oops</html>".to_string(), &[]);
        assert!(matches!(result, Err(TikTokError::MalformedResponse(_))));
    }

    #[test]
    fn test_wrong_user_shape_is_malformed() {
        let body = serde_json::json!({ "data": { "user": { "open_id": 123 } } }).to_string();
        let result = normalize_profile(body, &[]);
        assert!(matches!(result, Err(TikTokError::MalformedResponse(_))));
    }

    #[test]
    fn test_non_record_user_is_invalid() {
        for user in [
            serde_json::json!(["123", "alice99", "Alice", "http://x/a.png"]),
            serde_json::json!("123"),
            serde_json::json!(42),
        ] {
            let result = normalize_profile(envelope(user), &scopes(&["user.info.profile"]));
            assert!(matches!(result, Err(TikTokError::InvalidProfile(_))));
        }
    }

    #[test]
    fn test_missing_user_is_invalid() {
        for body in [
            "{}".to_string(),
            "null".to_string(),
            serde_json::json!({ "data": {} }).to_string(),
            serde_json::json!({ "data": { "user": null } }).to_string(),
        ] {
            let result = normalize_profile(body, &[]);
            assert!(matches!(result, Err(TikTokError::InvalidProfile(_))));
        }
    }

    #[test]
    fn test_missing_user_includes_provider_error() {
        let body = serde_json::json!({
            "data": {},
            "error": {
                "code": "scope_not_authorized",
                "message": "The user did not authorize the scope required for completing this request.",
                "log_id": "202206221504"
            }
        })
        .to_string();

        match normalize_profile(body, &[]) {
            Err(TikTokError::InvalidProfile(message)) => {
                assert!(message.starts_with("missing user data: scope_not_authorized"))
            }
            other => panic!("Expected InvalidProfile, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_or_empty_open_id_is_invalid() {
        for user in [
            serde_json::json!({ "display_name": "Alice", "avatar_url": "http://x/a.png" }),
            serde_json::json!({ "open_id": "", "display_name": "Alice" }),
        ] {
            match normalize_profile(envelope(user), &[]) {
                Err(TikTokError::InvalidProfile(message)) => assert_eq!(message, "missing open_id"),
                other => panic!("Expected InvalidProfile, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_verified_identity_from_profile() {
        let body = envelope(serde_json::json!({
            "open_id": "123",
            "username": "alice99",
            "display_name": "Alice",
            "avatar_url": ""
        }));
        let profile = normalize_profile(body, &scopes(&["user.info.profile"])).unwrap();

        let identity = VerifiedIdentity::from(&profile);
        assert_eq!(identity.provider_id, "tiktok");
        assert_eq!(identity.subject, "123");
        assert_eq!(identity.username.as_deref(), Some("alice99"));
        assert_eq!(identity.display_name.as_deref(), Some("Alice"));
        assert_eq!(identity.avatar_url, None);
    }

    #[test]
    fn test_extended_profile_serializes_flat() {
        let body = envelope(serde_json::json!({ "open_id": "123", "username": "alice99" }));
        let profile = normalize_profile(body, &scopes(&["user.info.profile"])).unwrap();

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["provider"], "tiktok");
        assert_eq!(value["open_id"], "123");
        assert_eq!(value["username"], "alice99");
        assert!(value.get("_raw").is_some());
    }
}
