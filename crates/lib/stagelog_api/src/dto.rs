//! Request and response bodies, camelCase on the wire.

use serde::{Deserialize, Serialize};

use stagelog_core::models::user::{Provider, User};

/// Error body returned by every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub user_id: String,
    pub password: String,
    pub nickname: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

/// Social login: the provider tag plus the provider's raw userinfo
/// payload, normalized server-side by the matching adapter.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2LoginRequest {
    pub provider: String,
    pub attributes: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckUserIdParams {
    pub user_id: String,
}

/// Token pair plus the identity summary clients render after login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub user_id: i64,
    pub email: String,
    pub nickname: String,
}

impl TokenResponse {
    pub fn of(access_token: String, refresh_token: String, user: &User) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            user_id: user.id,
            email: user.email.clone(),
            nickname: user.nickname.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    pub id: i64,
    pub email: String,
    pub user_id: String,
    pub nickname: String,
    pub profile_image_url: Option<String>,
    pub provider: Provider,
    pub is_social: bool,
    pub email_notification_enabled: bool,
}

impl UserProfileResponse {
    pub fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            user_id: user.user_handle.clone(),
            nickname: user.nickname.clone(),
            profile_image_url: user.profile_image_url.clone(),
            provider: user.provider,
            is_social: user.is_social(),
            email_notification_enabled: user.email_notification_enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateRequest {
    pub nickname: Option<String>,
    pub profile_image_url: Option<String>,
    pub email_notification_enabled: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stagelog_core::models::user::{Role, UserStatus};

    fn user() -> User {
        User {
            id: 7,
            email: "alice@example.com".into(),
            user_handle: "alice".into(),
            password_hash: Some("$2b$10$hash".into()),
            nickname: "앨리스".into(),
            profile_image_url: None,
            provider: Provider::Local,
            provider_id: Some("alice".into()),
            role: Role::User,
            status: UserStatus::Active,
            email_notification_enabled: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_response_is_camel_case_bearer() {
        let resp = TokenResponse::of("acc".into(), "ref".into(), &user());
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["tokenType"], "Bearer");
        assert_eq!(json["accessToken"], "acc");
        assert_eq!(json["refreshToken"], "ref");
        assert_eq!(json["userId"], 7);
        assert_eq!(json["nickname"], "앨리스");
    }

    #[test]
    fn profile_response_marks_local_accounts_as_non_social() {
        let profile = UserProfileResponse::from(&user());
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["isSocial"], false);
        assert_eq!(json["provider"], "LOCAL");
        assert_eq!(json["userId"], "alice");
    }
}
