//! Authentication primitives.
//!
//! Token codec, password hashing, refresh-token hashing, and the
//! database queries shared by the login/refresh/logout flows in
//! `stagelog_api`.

pub mod password;
pub mod queries;
pub mod refresh_hash;
pub mod token;

use thiserror::Error;

/// Authentication errors.
///
/// Everything except `Db` and `Internal` is a recoverable business
/// outcome that the HTTP layer maps to a specific client-visible code.
/// `InvalidCredentials` deliberately covers both unknown handles and
/// wrong passwords so callers cannot enumerate accounts.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is blocked")]
    AccountBlocked,

    #[error("too many login attempts")]
    TooManyAttempts,

    #[error("invalid refresh token")]
    InvalidRefreshToken,

    #[error("expired refresh token")]
    ExpiredRefreshToken,

    #[error("oauth2 provider error")]
    OAuth2ProviderError,

    #[error("oauth2 provider did not grant an email")]
    OAuth2MissingEmail,

    #[error("email already bound to another provider")]
    OAuth2EmailConflict,

    #[error("identity already exists")]
    DuplicateUser,

    #[error("user not found")]
    UserNotFound,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("token error: {0}")]
    Token(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}
