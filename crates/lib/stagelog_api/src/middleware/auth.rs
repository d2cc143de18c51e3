//! Request authentication gate.
//!
//! Applied to every route. A request without a bearer token passes
//! through anonymously; a token that fails verification is classified
//! (expired vs malformed) and the classification rides along in the
//! request extensions so protected handlers can report the exact
//! reason. A verified token of the wrong kind is rejected on the spot —
//! a refresh token never authenticates a request. Otherwise the
//! principal is resolved and attached after its lifecycle status is
//! checked.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use stagelog_core::auth::queries;
use stagelog_core::models::auth::{TokenKind, TokenVerification};
use stagelog_core::models::user::{Role, UserStatus};

use crate::AppState;
use crate::error::AppError;

/// Why a presented token was not accepted; consumed by [`CurrentUser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Expired,
    Malformed,
}

/// The authenticated identity attached to the request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub role: Role,
}

/// Extractor for handlers that require an authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }
        match parts.extensions.get::<TokenRejection>() {
            Some(TokenRejection::Expired) => Err(AppError::TokenExpired),
            Some(TokenRejection::Malformed) => Err(AppError::TokenInvalid),
            None => Err(AppError::Unauthorized("missing bearer token".into())),
        }
    }
}

/// Axum middleware performing the gate described above.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(&request) else {
        return Ok(next.run(request).await);
    };

    match state.tokens.verify(&token) {
        TokenVerification::Valid => {}
        TokenVerification::Expired => {
            request.extensions_mut().insert(TokenRejection::Expired);
            return Ok(next.run(request).await);
        }
        TokenVerification::Malformed => {
            request.extensions_mut().insert(TokenRejection::Malformed);
            return Ok(next.run(request).await);
        }
    }

    let claims = state
        .tokens
        .claims(&token)
        .map_err(|_| AppError::TokenInvalid)?;
    if claims.kind != TokenKind::Access {
        return Err(AppError::Unauthorized("not an access token".into()));
    }

    let user = queries::find_user_by_email(&state.pool, &claims.sub)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::Unauthorized("unknown token subject".into()))?;

    match user.status {
        UserStatus::Deleted => return Err(AppError::Forbidden("deleted account".into())),
        UserStatus::Suspended => return Err(AppError::Forbidden("suspended account".into())),
        UserStatus::Active => {}
    }

    request.extensions_mut().insert(CurrentUser(Principal {
        id: user.id,
        email: user.email,
        nickname: user.nickname,
        role: user.role,
    }));

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_auth(value: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(v) = value {
            builder = builder.header(AUTHORIZATION, v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn bearer_token_requires_the_scheme_prefix() {
        assert_eq!(
            bearer_token(&request_with_auth(Some("Bearer abc.def.ghi"))).as_deref(),
            Some("abc.def.ghi")
        );
        assert!(bearer_token(&request_with_auth(Some("Basic dXNlcg=="))).is_none());
        assert!(bearer_token(&request_with_auth(None)).is_none());
    }
}
