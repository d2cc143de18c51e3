//! Provider payload normalization.
//!
//! Each provider ships a differently shaped userinfo document; one
//! adapter per provider maps it onto [`UserInfo`]. Adding a provider
//! means adding one adapter function and one dispatch arm — the
//! resolver itself never changes.
//!
//! Kakao nests everything under `kakao_account`:
//!
//! ```json
//! {
//!   "id": 1234567890,
//!   "kakao_account": {
//!     "email": "user@kakao.com",
//!     "profile": { "nickname": "...", "profile_image_url": "https://..." }
//!   }
//! }
//! ```
//!
//! Google returns a flat OpenID Connect document (`sub`, `email`,
//! `name`, `picture`); Naver wraps its fields in a `response` object.
//! Email and profile fields are optional everywhere — consent is up to
//! the account holder.

use serde_json::Value;

use crate::auth::AuthError;
use crate::models::user::Provider;

/// Canonical shape of a social identity, as far as the provider was
/// willing to share it. Absent external id or email is the resolver's
/// problem, not the adapter's.
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub provider: Provider,
    pub provider_id: Option<String>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub profile_image_url: Option<String>,
}

/// Dispatch a raw userinfo payload to the adapter for `provider_tag`.
/// Unknown tags are a provider error.
pub fn from_payload(provider_tag: &str, attributes: &Value) -> Result<UserInfo, AuthError> {
    match provider_tag.to_ascii_lowercase().as_str() {
        "kakao" => Ok(kakao(attributes)),
        "google" => Ok(google(attributes)),
        "naver" => Ok(naver(attributes)),
        _ => Err(AuthError::OAuth2ProviderError),
    }
}

fn kakao(attributes: &Value) -> UserInfo {
    let account = attributes.get("kakao_account");
    let profile = account.and_then(|a| a.get("profile"));
    UserInfo {
        provider: Provider::Kakao,
        // numeric id in the wild
        provider_id: attributes.get("id").map(json_id_to_string),
        email: account.and_then(|a| str_field(a, "email")),
        nickname: profile.and_then(|p| str_field(p, "nickname")),
        profile_image_url: profile.and_then(|p| str_field(p, "profile_image_url")),
    }
}

fn google(attributes: &Value) -> UserInfo {
    UserInfo {
        provider: Provider::Google,
        provider_id: str_field(attributes, "sub"),
        email: str_field(attributes, "email"),
        nickname: str_field(attributes, "name"),
        profile_image_url: str_field(attributes, "picture"),
    }
}

fn naver(attributes: &Value) -> UserInfo {
    let response = attributes.get("response").unwrap_or(&Value::Null);
    UserInfo {
        provider: Provider::Naver,
        provider_id: str_field(response, "id"),
        email: str_field(response, "email"),
        nickname: str_field(response, "nickname"),
        profile_image_url: str_field(response, "profile_image"),
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn json_id_to_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kakao_parses_the_nested_account_shape() {
        let attrs = json!({
            "id": 1234567890u64,
            "kakao_account": {
                "email": "user@kakao.com",
                "profile": {
                    "nickname": "카카오유저",
                    "profile_image_url": "https://img.kakao.com/123.jpg"
                }
            }
        });

        let info = from_payload("kakao", &attrs).unwrap();
        assert_eq!(info.provider, Provider::Kakao);
        assert_eq!(info.provider_id.as_deref(), Some("1234567890"));
        assert_eq!(info.email.as_deref(), Some("user@kakao.com"));
        assert_eq!(info.nickname.as_deref(), Some("카카오유저"));
        assert_eq!(
            info.profile_image_url.as_deref(),
            Some("https://img.kakao.com/123.jpg")
        );
    }

    #[test]
    fn kakao_missing_id_leaves_provider_id_absent() {
        let info = from_payload("kakao", &json!({})).unwrap();
        assert!(info.provider_id.is_none());
    }

    #[test]
    fn kakao_missing_account_leaves_email_absent() {
        let info = from_payload("kakao", &json!({ "id": 7 })).unwrap();
        assert_eq!(info.provider_id.as_deref(), Some("7"));
        assert!(info.email.is_none());
        assert!(info.nickname.is_none());
    }

    #[test]
    fn kakao_without_email_consent_leaves_email_absent() {
        let attrs = json!({
            "id": 7,
            "kakao_account": { "profile": { "nickname": "유저" } }
        });
        let info = from_payload("kakao", &attrs).unwrap();
        assert!(info.email.is_none());
        assert_eq!(info.nickname.as_deref(), Some("유저"));
    }

    #[test]
    fn google_parses_the_flat_oidc_shape() {
        let attrs = json!({
            "sub": "google-123",
            "email": "user@gmail.com",
            "name": "Google User",
            "picture": "https://lh3.example.com/photo.jpg"
        });

        let info = from_payload("google", &attrs).unwrap();
        assert_eq!(info.provider, Provider::Google);
        assert_eq!(info.provider_id.as_deref(), Some("google-123"));
        assert_eq!(info.email.as_deref(), Some("user@gmail.com"));
        assert_eq!(info.nickname.as_deref(), Some("Google User"));
    }

    #[test]
    fn naver_unwraps_the_response_envelope() {
        let attrs = json!({
            "resultcode": "00",
            "response": {
                "id": "naver-abc",
                "email": "user@naver.com",
                "nickname": "네이버유저",
                "profile_image": "https://phinf.example.com/p.png"
            }
        });

        let info = from_payload("naver", &attrs).unwrap();
        assert_eq!(info.provider, Provider::Naver);
        assert_eq!(info.provider_id.as_deref(), Some("naver-abc"));
        assert_eq!(info.email.as_deref(), Some("user@naver.com"));
    }

    #[test]
    fn naver_without_response_has_nothing() {
        let info = from_payload("naver", &json!({ "resultcode": "99" })).unwrap();
        assert!(info.provider_id.is_none());
        assert!(info.email.is_none());
    }

    #[test]
    fn provider_tag_is_case_insensitive() {
        let info = from_payload("KAKAO", &json!({ "id": 1 })).unwrap();
        assert_eq!(info.provider, Provider::Kakao);
    }

    #[test]
    fn unknown_provider_is_a_provider_error() {
        let err = from_payload("myspace", &json!({})).unwrap_err();
        assert!(matches!(err, AuthError::OAuth2ProviderError));
    }
}
