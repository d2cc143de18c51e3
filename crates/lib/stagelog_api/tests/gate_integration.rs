//! Request-gate tests — build the real router and drive it with
//! `tower::ServiceExt::oneshot`. The pool is lazy and never connects;
//! every asserted path is decided before a query would run.

use axum::body::Body;
use axum::http::{Request, StatusCode, header::AUTHORIZATION};
use tower::ServiceExt;

use stagelog_api::config::ApiConfig;
use stagelog_api::{AppState, router};
use stagelog_core::auth::token::TokenCodec;

const JWT_SECRET: &str = "integration-test-secret";

fn test_state() -> AppState {
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        database_url: "postgres://localhost:1/unreachable".into(),
        jwt_secret: JWT_SECRET.into(),
        refresh_token_pepper: "integration-test-pepper".into(),
        access_token_ttl_secs: 3600,
        refresh_token_ttl_secs: 1_209_600,
        max_login_failures: 5,
        login_failure_window_secs: 600,
        login_lock_secs: 900,
    };
    let pool = sqlx::PgPool::connect_lazy(&config.database_url).expect("lazy pool");
    AppState::new(pool, config).expect("state")
}

fn get_me(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/users/me");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn error_code(resp: axum::response::Response) -> (StatusCode, String) {
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json: serde_json::Value = serde_json::from_slice(&bytes).expect("error body is JSON");
    (status, json["error"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() {
    let app = router(test_state());

    let resp = app.oneshot(get_me(None)).await.unwrap();

    let (status, code) = error_code(resp).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code, "unauthorized");
}

#[tokio::test]
async fn malformed_token_is_reported_as_invalid() {
    let app = router(test_state());

    let resp = app.oneshot(get_me(Some("garbage.token"))).await.unwrap();

    let (status, code) = error_code(resp).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code, "token_invalid");
}

#[tokio::test]
async fn expired_token_is_reported_as_expired() {
    let app = router(test_state());
    let expired_codec = TokenCodec::new(JWT_SECRET.as_bytes(), -120, -120);
    let stale = expired_codec
        .issue_access("alice@example.com", "USER")
        .unwrap();

    let resp = app.oneshot(get_me(Some(&stale))).await.unwrap();

    let (status, code) = error_code(resp).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code, "token_expired");
}

#[tokio::test]
async fn refresh_token_never_authenticates_a_request() {
    let state = test_state();
    let refresh = state
        .tokens
        .issue_refresh("alice@example.com", "USER")
        .unwrap();
    let app = router(state);

    let resp = app.oneshot(get_me(Some(&refresh))).await.unwrap();

    // Rejected by the gate itself, before any principal lookup.
    let (status, code) = error_code(resp).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code, "unauthorized");
}

#[tokio::test]
async fn token_signed_elsewhere_is_invalid_not_expired() {
    let app = router(test_state());
    let foreign = TokenCodec::new(b"some-other-secret", 3600, 3600);
    let forged = foreign.issue_access("mallory@example.com", "USER").unwrap();

    let resp = app.oneshot(get_me(Some(&forged))).await.unwrap();

    let (status, code) = error_code(resp).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code, "token_invalid");
}

#[tokio::test]
async fn anonymous_requests_pass_the_gate_untouched() {
    let app = router(test_state());

    // Unknown path: the gate lets the request through and the router
    // answers 404 — no auth error for anonymous traffic.
    let req = Request::builder()
        .uri("/api/nothing-here")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tagged_failures_do_not_block_public_paths() {
    let app = router(test_state());

    // A malformed token on an unknown path still falls through to 404;
    // the classification only matters where a principal is required.
    let req = Request::builder()
        .uri("/api/nothing-here")
        .header(AUTHORIZATION, "Bearer garbage")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
