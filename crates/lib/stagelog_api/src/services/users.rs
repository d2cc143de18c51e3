//! User profile service.

use sqlx::PgPool;
use tracing::info;

use stagelog_core::auth::queries;
use stagelog_core::models::user::{User, validate_nickname};

use crate::dto::{UserProfileResponse, UserUpdateRequest};
use crate::error::{AppError, AppResult};

async fn get_user(pool: &PgPool, user_id: i64) -> AppResult<User> {
    queries::find_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))
}

/// The caller's own profile.
pub async fn my_profile(pool: &PgPool, user_id: i64) -> AppResult<UserProfileResponse> {
    let user = get_user(pool, user_id).await?;
    Ok(UserProfileResponse::from(&user))
}

/// Partial profile update; absent fields stay untouched.
pub async fn update_profile(
    pool: &PgPool,
    user_id: i64,
    request: &UserUpdateRequest,
) -> AppResult<UserProfileResponse> {
    if let Some(nickname) = request.nickname.as_deref() {
        validate_nickname(nickname)?;
    }
    let user = queries::update_profile(
        pool,
        user_id,
        request.nickname.as_deref(),
        request.profile_image_url.as_deref(),
        request.email_notification_enabled,
    )
    .await?;
    Ok(UserProfileResponse::from(&user))
}

/// Soft-delete the account: the row stays, the status machine moves to
/// its terminal state. Any outstanding refresh credential dies at its
/// next use, when the refresh flow sees the non-active status.
pub async fn delete_account(pool: &PgPool, user_id: i64) -> AppResult<()> {
    let user = get_user(pool, user_id).await?;
    let next = user.deleted()?;
    queries::update_status(pool, user_id, next).await?;
    info!(user_id, "account deleted");
    Ok(())
}
