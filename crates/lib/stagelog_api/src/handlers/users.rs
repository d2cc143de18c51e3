//! User profile request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::dto::{UserProfileResponse, UserUpdateRequest};
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::services::users;

/// `GET /api/users/me` — the caller's profile.
pub async fn my_profile_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> AppResult<Json<UserProfileResponse>> {
    let resp = users::my_profile(&state.pool, principal.id).await?;
    Ok(Json(resp))
}

/// `PATCH /api/users/me` — partial profile update.
pub async fn update_profile_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Json(body): Json<UserUpdateRequest>,
) -> AppResult<Json<UserProfileResponse>> {
    let resp = users::update_profile(&state.pool, principal.id, &body).await?;
    Ok(Json(resp))
}

/// `DELETE /api/users/me` — soft-delete the caller's account.
pub async fn delete_account_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> AppResult<StatusCode> {
    users::delete_account(&state.pool, principal.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
