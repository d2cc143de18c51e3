//! User domain model.
//!
//! A user is either a local account (handle + password) or a social
//! account bound to an OAuth2 provider. The two are mutually exclusive:
//! a local account always carries a password hash, a social account
//! never does. The database backs this with a CHECK constraint; the
//! constructors here enforce it before a row ever exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;

/// Account origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "provider_kind", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Provider {
    Local,
    Kakao,
    Google,
    Naver,
}

impl Provider {
    /// Lowercase tag used in generated social handles and payload dispatch.
    pub fn tag(self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::Kakao => "kakao",
            Provider::Google => "google",
            Provider::Naver => "naver",
        }
    }
}

/// Account lifecycle state. Users are never physically deleted;
/// deletion is the terminal state of this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Active,
    Suspended,
    Deleted,
}

impl UserStatus {
    /// Legal transitions: ACTIVE ⇄ SUSPENDED, either → DELETED.
    pub fn can_transition_to(self, next: UserStatus) -> bool {
        matches!(
            (self, next),
            (UserStatus::Active, UserStatus::Suspended)
                | (UserStatus::Active, UserStatus::Deleted)
                | (UserStatus::Suspended, UserStatus::Active)
                | (UserStatus::Suspended, UserStatus::Deleted)
        )
    }
}

/// Role claim carried in issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

/// Database row for `users`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub user_handle: String,
    pub password_hash: Option<String>,
    pub nickname: String,
    pub profile_image_url: Option<String>,
    pub provider: Provider,
    pub provider_id: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub email_notification_enabled: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this account came from an OAuth2 provider.
    pub fn is_social(&self) -> bool {
        self.provider != Provider::Local
    }

    /// Status after a suspension request, if the move is legal.
    pub fn suspended(&self) -> Result<UserStatus, AuthError> {
        self.transition_to(UserStatus::Suspended)
    }

    /// Status after a reactivation request, if the move is legal.
    pub fn activated(&self) -> Result<UserStatus, AuthError> {
        self.transition_to(UserStatus::Active)
    }

    /// Status after an account deletion request, if the move is legal.
    pub fn deleted(&self) -> Result<UserStatus, AuthError> {
        self.transition_to(UserStatus::Deleted)
    }

    fn transition_to(&self, next: UserStatus) -> Result<UserStatus, AuthError> {
        if !self.status.can_transition_to(next) {
            return Err(AuthError::Validation(format!(
                "illegal status transition {:?} -> {next:?}",
                self.status
            )));
        }
        Ok(next)
    }
}

/// Validated fields for a user that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub user_handle: String,
    pub password_hash: Option<String>,
    pub nickname: String,
    pub profile_image_url: Option<String>,
    pub provider: Provider,
    pub provider_id: Option<String>,
    pub role: Role,
    pub status: UserStatus,
}

impl NewUser {
    /// A local account: handle + password hash, provider LOCAL.
    pub fn local(
        user_handle: &str,
        password_hash: &str,
        nickname: &str,
        email: &str,
    ) -> Result<Self, AuthError> {
        validate_handle(user_handle)?;
        if password_hash.trim().is_empty() {
            return Err(AuthError::Validation("password hash must not be blank".into()));
        }
        validate_nickname(nickname)?;
        validate_email(email)?;

        Ok(Self {
            email: email.to_string(),
            user_handle: user_handle.to_string(),
            password_hash: Some(password_hash.to_string()),
            nickname: nickname.to_string(),
            profile_image_url: None,
            provider: Provider::Local,
            // The handle doubles as the external id so that
            // (provider, provider_id) stays unique for local accounts too.
            provider_id: Some(user_handle.to_string()),
            role: Role::User,
            status: UserStatus::Active,
        })
    }

    /// A social account: no password, handle derived from the provider.
    pub fn social(
        email: &str,
        nickname: &str,
        profile_image_url: Option<&str>,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Self, AuthError> {
        if provider == Provider::Local || provider_id.trim().is_empty() {
            return Err(AuthError::Validation(
                "social accounts require a non-local provider and an external id".into(),
            ));
        }
        validate_nickname(nickname)?;
        validate_email(email)?;

        Ok(Self {
            email: email.to_string(),
            user_handle: format!("{}_{provider_id}", provider.tag()),
            password_hash: None,
            nickname: nickname.to_string(),
            profile_image_url: profile_image_url.map(str::to_string),
            provider,
            provider_id: Some(provider_id.to_string()),
            role: Role::User,
            status: UserStatus::Active,
        })
    }
}

/// Login handle: 2–20 chars, ASCII letters, digits, underscore.
pub fn validate_handle(handle: &str) -> Result<(), AuthError> {
    let len = handle.chars().count();
    if !(2..=20).contains(&len)
        || !handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AuthError::Validation(
            "handle must be 2-20 characters of letters, digits or underscore".into(),
        ));
    }
    Ok(())
}

/// Nickname: non-blank, 2–20 characters.
pub fn validate_nickname(nickname: &str) -> Result<(), AuthError> {
    let len = nickname.trim().chars().count();
    if !(2..=20).contains(&len) {
        return Err(AuthError::Validation(
            "nickname must be 2-20 characters".into(),
        ));
    }
    Ok(())
}

/// Email shape: local part, `@`, dotted domain with an alphabetic TLD.
pub fn validate_email(email: &str) -> Result<(), AuthError> {
    let ok = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && local
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '.' | '-'))
            && domain
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'))
            && domain
                .rsplit_once('.')
                .is_some_and(|(name, tld)| {
                    !name.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
                })
    });
    if !ok {
        return Err(AuthError::Validation("invalid email format".into()));
    }
    Ok(())
}
