//! Authentication request handlers.

use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::StatusCode;

use crate::AppState;
use crate::dto::{
    CheckUserIdParams, LoginRequest, OAuth2LoginRequest, RefreshRequest, SignupRequest,
    TokenResponse,
};
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::services::auth;

/// `GET /api/auth/check-userid?userId=` — whether a handle is taken.
pub async fn check_user_id_handler(
    State(state): State<AppState>,
    Query(params): Query<CheckUserIdParams>,
) -> AppResult<Json<bool>> {
    let exists = auth::handle_exists(&state, &params.user_id).await?;
    Ok(Json(exists))
}

/// `POST /api/auth/signup` — create a local account, returns the id.
pub async fn signup_handler(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<i64>)> {
    let id = auth::sign_up(&state, &body.user_id, &body.password, &body.nickname, &body.email)
        .await?;
    Ok((StatusCode::CREATED, Json(id)))
}

/// `POST /api/auth/login` — authenticate with handle + password.
pub async fn login_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::login(&state, &body.user_id, &body.password, &addr.ip().to_string()).await?;
    Ok(Json(resp))
}

/// `POST /api/auth/oauth2/login` — social login with a provider payload.
pub async fn oauth2_login_handler(
    State(state): State<AppState>,
    Json(body): Json<OAuth2LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::login_with_oauth2(&state, &body.provider, &body.attributes).await?;
    Ok(Json(resp))
}

/// `POST /api/auth/refresh` — exchange a refresh token for a new pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::refresh(&state, &body.refresh_token).await?;
    Ok(Json(resp))
}

/// `POST /api/auth/logout` — revoke the caller's refresh credential.
pub async fn logout_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> AppResult<StatusCode> {
    auth::logout(&state, &principal.email).await?;
    Ok(StatusCode::NO_CONTENT)
}
