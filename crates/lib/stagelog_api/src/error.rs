//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::dto::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
///
/// The auth variants mirror the business outcomes of the login, refresh
/// and social-login flows one to one, so clients can react to a stable
/// machine-readable code. `Internal` never leaks detail to the client.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Account blocked")]
    AccountBlocked,

    #[error("Too many login attempts")]
    TooManyAttempts,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Expired refresh token")]
    ExpiredRefreshToken,

    #[error("OAuth2 provider error")]
    OAuth2ProviderError,

    #[error("OAuth2 provider did not grant an email")]
    OAuth2MissingEmail,

    #[error("Email already bound to another provider")]
    OAuth2EmailConflict,

    #[error("Identity already exists")]
    DuplicateUser,

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.clone()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.clone()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.clone()),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid credentials".into(),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "token_expired",
                "Access token expired".into(),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "token_invalid",
                "Invalid access token".into(),
            ),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.clone()),
            AppError::AccountBlocked => (
                StatusCode::FORBIDDEN,
                "account_blocked",
                "This account is restricted".into(),
            ),
            AppError::TooManyAttempts => (
                StatusCode::TOO_MANY_REQUESTS,
                "too_many_attempts",
                "Too many login attempts, try again later".into(),
            ),
            AppError::InvalidRefreshToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_refresh_token",
                "Invalid refresh token".into(),
            ),
            AppError::ExpiredRefreshToken => (
                StatusCode::UNAUTHORIZED,
                "expired_refresh_token",
                "Expired refresh token".into(),
            ),
            AppError::OAuth2ProviderError => (
                StatusCode::BAD_GATEWAY,
                "oauth2_provider_error",
                "Social login failed at the provider".into(),
            ),
            AppError::OAuth2MissingEmail => (
                StatusCode::BAD_REQUEST,
                "oauth2_missing_email",
                "The social account did not provide an email".into(),
            ),
            AppError::OAuth2EmailConflict => (
                StatusCode::CONFLICT,
                "oauth2_email_conflict",
                "An account with this email already exists".into(),
            ),
            AppError::DuplicateUser => (
                StatusCode::CONFLICT,
                "duplicate_identity",
                "An account with this handle or email already exists".into(),
            ),
            AppError::Internal(detail) => {
                tracing::error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".into(),
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".into()),
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<stagelog_core::auth::AuthError> for AppError {
    fn from(e: stagelog_core::auth::AuthError) -> Self {
        use stagelog_core::auth::AuthError;
        match e {
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::AccountBlocked => AppError::AccountBlocked,
            AuthError::TooManyAttempts => AppError::TooManyAttempts,
            AuthError::InvalidRefreshToken => AppError::InvalidRefreshToken,
            AuthError::ExpiredRefreshToken => AppError::ExpiredRefreshToken,
            AuthError::OAuth2ProviderError => AppError::OAuth2ProviderError,
            AuthError::OAuth2MissingEmail => AppError::OAuth2MissingEmail,
            AuthError::OAuth2EmailConflict => AppError::OAuth2EmailConflict,
            AuthError::DuplicateUser => AppError::DuplicateUser,
            AuthError::UserNotFound => AppError::NotFound("user not found".into()),
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::Token(msg) => AppError::Unauthorized(msg),
            AuthError::Db(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_their_status_codes() {
        let cases = [
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AppError::TooManyAttempts, StatusCode::TOO_MANY_REQUESTS),
            (AppError::AccountBlocked, StatusCode::FORBIDDEN),
            (AppError::InvalidRefreshToken, StatusCode::UNAUTHORIZED),
            (AppError::ExpiredRefreshToken, StatusCode::UNAUTHORIZED),
            (AppError::OAuth2ProviderError, StatusCode::BAD_GATEWAY),
            (AppError::OAuth2MissingEmail, StatusCode::BAD_REQUEST),
            (AppError::OAuth2EmailConflict, StatusCode::CONFLICT),
            (AppError::DuplicateUser, StatusCode::CONFLICT),
            (AppError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AppError::TokenInvalid, StatusCode::UNAUTHORIZED),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn internal_errors_do_not_echo_detail() {
        let resp = AppError::Internal("connection string with password".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn core_taxonomy_maps_one_to_one() {
        use stagelog_core::auth::AuthError;
        assert!(matches!(
            AppError::from(AuthError::InvalidCredentials),
            AppError::InvalidCredentials
        ));
        assert!(matches!(
            AppError::from(AuthError::ExpiredRefreshToken),
            AppError::ExpiredRefreshToken
        ));
        assert!(matches!(
            AppError::from(AuthError::OAuth2EmailConflict),
            AppError::OAuth2EmailConflict
        ));
    }
}
