//! # stagelog_api
//!
//! HTTP API library for Stagelog.

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use stagelog_core::auth::AuthError;
use stagelog_core::auth::refresh_hash::RefreshTokenHasher;
use stagelog_core::auth::token::TokenCodec;

use crate::config::ApiConfig;
use crate::handlers::{auth, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Token codec constructed from the configured secret and lifetimes.
    pub tokens: Arc<TokenCodec>,
    /// Keyed refresh-token hasher.
    pub refresh_hasher: Arc<RefreshTokenHasher>,
}

impl AppState {
    /// Build the state from validated configuration. Fails when the
    /// crypto configuration is unusable, before any request is served.
    pub fn new(pool: PgPool, config: ApiConfig) -> Result<Self, AuthError> {
        let tokens = Arc::new(TokenCodec::new(
            config.jwt_secret.as_bytes(),
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        ));
        let refresh_hasher = Arc::new(RefreshTokenHasher::new(&config.refresh_token_pepper)?);
        Ok(Self {
            pool,
            config,
            tokens,
            refresh_hasher,
        })
    }
}

/// Run embedded database migrations.
///
/// Delegates to `stagelog_core::migrate::migrate()` which owns the
/// migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    stagelog_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
///
/// The authentication gate runs on every route; routes that need a
/// principal take the `CurrentUser` extractor, everything else passes
/// through anonymously.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/check-userid", get(auth::check_user_id_handler))
        .route("/api/auth/signup", post(auth::signup_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/oauth2/login", post(auth::oauth2_login_handler))
        .route("/api/auth/refresh", post(auth::refresh_handler))
        .route("/api/auth/logout", post(auth::logout_handler))
        .route(
            "/api/users/me",
            get(users::my_profile_handler)
                .patch(users::update_profile_handler)
                .delete(users::delete_account_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ))
        .layer(cors)
        .with_state(state)
}
