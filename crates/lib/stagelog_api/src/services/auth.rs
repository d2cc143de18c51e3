//! Authentication service — signup, login, social login, refresh, logout.
//!
//! The login state machine is strict about ordering: the lockout check
//! runs before any credential lookup, failure recording happens for
//! unknown handles and wrong passwords alike (one generic error for
//! both), and a blocked account neither records nor clears failures —
//! a correct password against a blocked account is not a brute-force
//! signal.

use chrono::Utc;
use tracing::info;

use stagelog_core::auth::{password, queries};
use stagelog_core::models::auth::{TokenKind, TokenVerification};
use stagelog_core::models::user::{NewUser, User, UserStatus};
use stagelog_core::oauth2;

use crate::AppState;
use crate::dto::TokenResponse;
use crate::error::{AppError, AppResult};
use crate::services::login_attempts;

/// Whether a login handle is already taken.
pub async fn handle_exists(state: &AppState, handle: &str) -> AppResult<bool> {
    Ok(queries::handle_exists(&state.pool, handle).await?)
}

/// Register a local account. Returns the new user's id; tokens are only
/// issued by an explicit login.
pub async fn sign_up(
    state: &AppState,
    user_id: &str,
    password_raw: &str,
    nickname: &str,
    email: &str,
) -> AppResult<i64> {
    validate_password(password_raw)?;

    if queries::handle_exists(&state.pool, user_id).await? {
        return Err(AppError::DuplicateUser);
    }
    if queries::email_exists(&state.pool, email).await? {
        return Err(AppError::DuplicateUser);
    }

    let password_hash = password::hash_password(password_raw)?;
    let new_user = NewUser::local(user_id, &password_hash, nickname, email)?;
    let user = queries::insert_user(&state.pool, &new_user).await?;

    info!(user_id = %user.user_handle, "local account created");
    Ok(user.id)
}

/// Authenticate with handle + password from `client_ip`.
pub async fn login(
    state: &AppState,
    user_id: &str,
    password_raw: &str,
    client_ip: &str,
) -> AppResult<TokenResponse> {
    login_attempts::assert_not_locked(&state.pool, user_id, client_ip).await?;

    let policy = state.config.lockout_policy();

    // Unknown handle and wrong password produce the same error so the
    // response does not reveal whether the handle exists.
    let Some(user) = queries::find_user_by_handle(&state.pool, user_id).await? else {
        login_attempts::record_failure(&state.pool, &policy, user_id, client_ip).await?;
        return Err(AppError::InvalidCredentials);
    };

    // A social account has no hash; a corrupt hash verifies as false.
    // Both count as "does not match".
    let password_matches = match user.password_hash.as_deref() {
        Some(hash) => password::verify_password(password_raw, hash).unwrap_or(false),
        None => false,
    };
    if !password_matches {
        login_attempts::record_failure(&state.pool, &policy, user_id, client_ip).await?;
        return Err(AppError::InvalidCredentials);
    }

    if user.status != UserStatus::Active {
        return Err(AppError::AccountBlocked);
    }

    login_attempts::clear_failures(&state.pool, user_id, client_ip).await?;
    queries::touch_last_login(&state.pool, user.id).await?;

    issue_tokens(state, &user).await
}

/// Social login: normalize the provider payload, resolve the identity,
/// then issue tokens. No lockout tracking on this path.
pub async fn login_with_oauth2(
    state: &AppState,
    provider_tag: &str,
    attributes: &serde_json::Value,
) -> AppResult<TokenResponse> {
    let user_info = oauth2::userinfo::from_payload(provider_tag, attributes)?;
    let user = oauth2::resolve(&state.pool, &user_info).await?;
    issue_tokens(state, &user).await
}

/// Exchange a refresh token for a fresh pair, rotating the stored
/// credential in the same step.
pub async fn refresh(state: &AppState, refresh_token: &str) -> AppResult<TokenResponse> {
    if refresh_token.trim().is_empty() {
        return Err(AppError::InvalidRefreshToken);
    }

    match state.tokens.verify(refresh_token) {
        TokenVerification::Valid => {}
        TokenVerification::Expired | TokenVerification::Malformed => {
            return Err(AppError::InvalidRefreshToken);
        }
    }
    let claims = state
        .tokens
        .claims(refresh_token)
        .map_err(|_| AppError::InvalidRefreshToken)?;
    if claims.kind != TokenKind::Refresh {
        return Err(AppError::InvalidRefreshToken);
    }

    let presented_hash = state.refresh_hasher.hash(refresh_token)?;
    let Some(stored) =
        queries::find_refresh_credential_by_hash(&state.pool, &presented_hash).await?
    else {
        return Err(AppError::InvalidRefreshToken);
    };

    let now = Utc::now();
    if stored.is_expired(now) {
        queries::delete_refresh_credential_by_email(&state.pool, &stored.email).await?;
        return Err(AppError::ExpiredRefreshToken);
    }

    let Some(user) = queries::find_user_by_email(&state.pool, &claims.sub).await? else {
        return Err(AppError::NotFound("user not found".into()));
    };
    if user.status != UserStatus::Active {
        queries::delete_refresh_credential_by_email(&state.pool, &stored.email).await?;
        return Err(AppError::AccountBlocked);
    }

    let access_token = state.tokens.issue_access(&user.email, user.role.as_str())?;
    let new_refresh = state.tokens.issue_refresh(&user.email, user.role.as_str())?;
    let new_hash = state.refresh_hasher.hash(&new_refresh)?;
    let new_expiry = now + state.tokens.refresh_ttl();

    // Compare-and-swap on the previous hash: a concurrent refresh that
    // commits first wins, and this one reads as an ordinary stale token.
    let rotated = queries::rotate_refresh_credential(
        &state.pool,
        stored.id,
        &presented_hash,
        &new_hash,
        new_expiry,
    )
    .await?;
    if !rotated {
        return Err(AppError::InvalidRefreshToken);
    }

    Ok(TokenResponse::of(access_token, new_refresh, &user))
}

/// Drop the user's refresh credential. Idempotent.
pub async fn logout(state: &AppState, email: &str) -> AppResult<()> {
    queries::delete_refresh_credential_by_email(&state.pool, email).await?;
    info!(email, "logged out");
    Ok(())
}

/// Create an access/refresh pair, persist the refresh digest, and build
/// the response. Private on purpose: reaching token issuance without
/// going through the flows above would skip the credential upsert and
/// break rotation.
async fn issue_tokens(state: &AppState, user: &User) -> AppResult<TokenResponse> {
    let access_token = state.tokens.issue_access(&user.email, user.role.as_str())?;
    let refresh_token = state.tokens.issue_refresh(&user.email, user.role.as_str())?;
    let token_hash = state.refresh_hasher.hash(&refresh_token)?;
    let expires_at = Utc::now() + state.tokens.refresh_ttl();

    queries::upsert_refresh_credential(&state.pool, &user.email, &token_hash, expires_at).await?;

    Ok(TokenResponse::of(access_token, refresh_token, user))
}

/// Password policy: 8–20 chars with at least one letter, one digit and
/// one special character.
fn validate_password(password: &str) -> AppResult<()> {
    let len = password.chars().count();
    let ok = (8..=20).contains(&len)
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_ascii_punctuation());
    if !ok {
        return Err(AppError::Validation(
            "password must be 8-20 characters and include a letter, a digit and a special character"
                .into(),
        ));
    }
    Ok(())
}
