//! Token and session domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminator carried in every issued token. An access token must
/// never satisfy a refresh operation and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims embedded in issued tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — the user's email.
    pub sub: String,
    /// Role label (e.g. `"USER"`).
    pub role: String,
    /// Token kind discriminator.
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Three-way verification outcome. Expired and malformed tokens are
/// distinguished so the request boundary can report them separately;
/// neither is ever accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenVerification {
    Valid,
    Expired,
    Malformed,
}

/// Database row for `refresh_credentials` — the single live refresh
/// credential of one user. Only the keyed digest of the raw token is
/// stored; the row is replaced in place on every rotation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshCredential {
    pub id: i64,
    pub email: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshCredential {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
