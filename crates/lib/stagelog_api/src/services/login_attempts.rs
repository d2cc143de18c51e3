//! Login-attempt tracking service.
//!
//! Failures and locks are keyed by (handle, client address): the same
//! handle accumulates failures separately per source address.

use chrono::Utc;
use sqlx::PgPool;

use stagelog_core::auth::queries;
use stagelog_core::models::attempt::{LockoutPolicy, LoginAttempt};

use crate::error::{AppError, AppResult};

/// Fail with a lockout error while the pair's lock is active. Must run
/// before any credential lookup so a locked pair is rejected uniformly
/// whether or not the handle exists.
pub async fn assert_not_locked(pool: &PgPool, handle: &str, client_ip: &str) -> AppResult<()> {
    let now = Utc::now();
    if let Some(attempt) = queries::find_attempt(pool, handle, client_ip).await?
        && attempt.is_locked(now)
    {
        return Err(AppError::TooManyAttempts);
    }
    Ok(())
}

/// Record one failure for the pair.
///
/// Runs in its own transaction straight off the pool: whatever happens
/// to the surrounding login request afterwards, the recorded failure
/// stays committed.
pub async fn record_failure(
    pool: &PgPool,
    policy: &LockoutPolicy,
    handle: &str,
    client_ip: &str,
) -> AppResult<()> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    match queries::find_attempt_for_update(&mut tx, handle, client_ip).await? {
        Some(mut attempt) => {
            attempt.record_failure(now, policy);
            queries::update_attempt(&mut tx, &attempt).await?;
        }
        None => {
            let attempt = LoginAttempt::first_failure(handle, client_ip, now);
            queries::insert_attempt(&mut tx, &attempt).await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

/// Forget the pair's failure history. Called only after a fully
/// successful login (credentials verified and the account active).
pub async fn clear_failures(pool: &PgPool, handle: &str, client_ip: &str) -> AppResult<()> {
    queries::delete_attempt(pool, handle, client_ip).await?;
    Ok(())
}
