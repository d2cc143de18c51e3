//! Auth-related database queries.
//!
//! Uniqueness constraints (email, handle, (provider, provider_id),
//! refresh credential per email, attempt record per (handle, address))
//! are the only concurrency control: conflicting writers are detected
//! at commit, not serialized in process.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use super::AuthError;
use crate::models::attempt::LoginAttempt;
use crate::models::auth::RefreshCredential;
use crate::models::user::{NewUser, User, UserStatus};

const USER_COLUMNS: &str = "id, email, user_handle, password_hash, nickname, profile_image_url, \
     provider, provider_id, role, status, email_notification_enabled, \
     last_login_at, created_at, updated_at";

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

// =============================================================================
// User queries
// =============================================================================

/// Fetch a user by login handle.
pub async fn find_user_by_handle(pool: &PgPool, handle: &str) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE user_handle = $1"
    ))
    .bind(handle)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Fetch a user by email.
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Fetch a user by id.
pub async fn find_user_by_id(pool: &PgPool, user_id: i64) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Fetch a user by (provider, external id).
pub async fn find_user_by_provider(
    pool: &PgPool,
    provider: crate::models::user::Provider,
    provider_id: &str,
) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE provider = $1 AND provider_id = $2"
    ))
    .bind(provider)
    .bind(provider_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Check whether a login handle is already taken.
pub async fn handle_exists(pool: &PgPool, handle: &str) -> Result<bool, AuthError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE user_handle = $1)",
    )
    .bind(handle)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Check whether an email is already registered.
pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AuthError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Insert a new user. A unique-constraint conflict (racing signups or
/// social logins) surfaces as `DuplicateUser`.
pub async fn insert_user(pool: &PgPool, user: &NewUser) -> Result<User, AuthError> {
    let row = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (email, user_handle, password_hash, nickname, profile_image_url, \
                            provider, provider_id, role, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&user.email)
    .bind(&user.user_handle)
    .bind(user.password_hash.as_deref())
    .bind(&user.nickname)
    .bind(user.profile_image_url.as_deref())
    .bind(user.provider)
    .bind(user.provider_id.as_deref())
    .bind(user.role)
    .bind(user.status)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AuthError::DuplicateUser
        } else {
            AuthError::Db(e)
        }
    })?;
    Ok(row)
}

/// Stamp a successful login.
pub async fn touch_last_login(pool: &PgPool, user_id: i64) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET last_login_at = now(), updated_at = now() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Update profile fields; `None` leaves the column untouched.
pub async fn update_profile(
    pool: &PgPool,
    user_id: i64,
    nickname: Option<&str>,
    profile_image_url: Option<&str>,
    email_notification_enabled: Option<bool>,
) -> Result<User, AuthError> {
    let row = sqlx::query_as::<_, User>(&format!(
        "UPDATE users \
         SET nickname = COALESCE($2, nickname), \
             profile_image_url = COALESCE($3, profile_image_url), \
             email_notification_enabled = COALESCE($4, email_notification_enabled), \
             updated_at = now() \
         WHERE id = $1 \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(nickname)
    .bind(profile_image_url)
    .bind(email_notification_enabled)
    .fetch_optional(pool)
    .await?
    .ok_or(AuthError::UserNotFound)?;
    Ok(row)
}

/// Write a new lifecycle status.
pub async fn update_status(
    pool: &PgPool,
    user_id: i64,
    status: UserStatus,
) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET status = $2, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .bind(status)
        .execute(pool)
        .await?;
    Ok(())
}

// =============================================================================
// Refresh credential queries
// =============================================================================

/// Create or replace the single refresh credential of a user.
pub async fn upsert_refresh_credential(
    pool: &PgPool,
    email: &str,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO refresh_credentials (email, token_hash, expires_at) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (email) DO UPDATE \
         SET token_hash = EXCLUDED.token_hash, \
             expires_at = EXCLUDED.expires_at, \
             updated_at = now()",
    )
    .bind(email)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Point lookup by digest — the only read path into the store.
pub async fn find_refresh_credential_by_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<RefreshCredential>, AuthError> {
    let row = sqlx::query_as::<_, RefreshCredential>(
        "SELECT id, email, token_hash, expires_at FROM refresh_credentials WHERE token_hash = $1",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Replace hash and expiry in place, guarded by the previous hash.
/// Returns `false` when another rotation already replaced the row —
/// the caller lost the race and the presented token is no longer live.
pub async fn rotate_refresh_credential(
    pool: &PgPool,
    credential_id: i64,
    previous_hash: &str,
    new_hash: &str,
    new_expires_at: DateTime<Utc>,
) -> Result<bool, AuthError> {
    let result = sqlx::query(
        "UPDATE refresh_credentials \
         SET token_hash = $3, expires_at = $4, updated_at = now() \
         WHERE id = $1 AND token_hash = $2",
    )
    .bind(credential_id)
    .bind(previous_hash)
    .bind(new_hash)
    .bind(new_expires_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Drop a user's refresh credential. Idempotent.
pub async fn delete_refresh_credential_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<(), AuthError> {
    sqlx::query("DELETE FROM refresh_credentials WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await?;
    Ok(())
}

// =============================================================================
// Login attempt queries
// =============================================================================

/// Fetch the attempt record for a (handle, address) pair.
pub async fn find_attempt(
    pool: &PgPool,
    handle: &str,
    client_ip: &str,
) -> Result<Option<LoginAttempt>, AuthError> {
    let row = sqlx::query_as::<_, LoginAttempt>(
        "SELECT id, user_handle, client_ip, fail_count, first_failed_at, locked_until \
         FROM login_attempts WHERE user_handle = $1 AND client_ip = $2",
    )
    .bind(handle)
    .bind(client_ip)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Fetch the attempt record inside a transaction, locking the row.
pub async fn find_attempt_for_update(
    conn: &mut PgConnection,
    handle: &str,
    client_ip: &str,
) -> Result<Option<LoginAttempt>, AuthError> {
    let row = sqlx::query_as::<_, LoginAttempt>(
        "SELECT id, user_handle, client_ip, fail_count, first_failed_at, locked_until \
         FROM login_attempts WHERE user_handle = $1 AND client_ip = $2 FOR UPDATE",
    )
    .bind(handle)
    .bind(client_ip)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Insert a first-failure record. If another writer created the row
/// since our lookup, fold this failure in as a plain increment.
pub async fn insert_attempt(
    conn: &mut PgConnection,
    attempt: &LoginAttempt,
) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO login_attempts (user_handle, client_ip, fail_count, first_failed_at, locked_until) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (user_handle, client_ip) DO UPDATE \
         SET fail_count = login_attempts.fail_count + 1",
    )
    .bind(&attempt.user_handle)
    .bind(&attempt.client_ip)
    .bind(attempt.fail_count)
    .bind(attempt.first_failed_at)
    .bind(attempt.locked_until)
    .execute(conn)
    .await?;
    Ok(())
}

/// Persist an updated attempt record.
pub async fn update_attempt(
    conn: &mut PgConnection,
    attempt: &LoginAttempt,
) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE login_attempts \
         SET fail_count = $2, first_failed_at = $3, locked_until = $4 \
         WHERE id = $1",
    )
    .bind(attempt.id)
    .bind(attempt.fail_count)
    .bind(attempt.first_failed_at)
    .bind(attempt.locked_until)
    .execute(conn)
    .await?;
    Ok(())
}

/// Delete the attempt record for a pair. Called only after a fully
/// successful login.
pub async fn delete_attempt(pool: &PgPool, handle: &str, client_ip: &str) -> Result<(), AuthError> {
    sqlx::query("DELETE FROM login_attempts WHERE user_handle = $1 AND client_ip = $2")
        .bind(handle)
        .bind(client_ip)
        .execute(pool)
        .await?;
    Ok(())
}
