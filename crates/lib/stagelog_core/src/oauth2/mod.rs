//! OAuth2 identity resolution.
//!
//! Takes the normalized [`UserInfo`](userinfo::UserInfo) shape produced
//! by a provider adapter and resolves it to a registered user: validate
//! what the provider sent, refuse emails already bound elsewhere, then
//! look up or create the identity and gate on its lifecycle status.

pub mod userinfo;

use sqlx::PgPool;
use tracing::info;

use crate::auth::{AuthError, queries};
use crate::models::user::{NewUser, User, UserStatus};
use userinfo::UserInfo;

/// Resolve a social identity, creating it on first contact.
///
/// Failure modes, in order: missing external id (`OAuth2ProviderError`),
/// missing email (`OAuth2MissingEmail`), email bound to a different
/// provider (`OAuth2EmailConflict`), non-active account
/// (`AccountBlocked`). Repeat contact only stamps the login timestamp.
pub async fn resolve(pool: &PgPool, info: &UserInfo) -> Result<User, AuthError> {
    let provider_id = info
        .provider_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or(AuthError::OAuth2ProviderError)?;
    let email = info
        .email
        .as_deref()
        .filter(|email| !email.trim().is_empty())
        .ok_or(AuthError::OAuth2MissingEmail)?;

    if let Some(existing) = queries::find_user_by_email(pool, email).await?
        && existing.provider != info.provider
    {
        return Err(AuthError::OAuth2EmailConflict);
    }

    let user = match queries::find_user_by_provider(pool, info.provider, provider_id).await? {
        Some(user) => {
            queries::touch_last_login(pool, user.id).await?;
            user
        }
        None => {
            let nickname = info.nickname.as_deref().unwrap_or_default();
            let new_user = NewUser::social(
                email,
                nickname,
                info.profile_image_url.as_deref(),
                info.provider,
                provider_id,
            )?;
            let created = queries::insert_user(pool, &new_user).await?;
            info!(
                provider = info.provider.tag(),
                user_id = created.id,
                "created social account on first login"
            );
            created
        }
    };

    if user.status != UserStatus::Active {
        return Err(AuthError::AccountBlocked);
    }

    Ok(user)
}
