//! Keyed one-way digest of refresh tokens.
//!
//! Only this digest is ever persisted; the store supports point lookup
//! by digest and nothing else. The pepper is a server-held secret
//! distinct from the token-signing secret.

use sha2::{Digest, Sha256};

use super::AuthError;

/// Hashes raw refresh tokens with a server-held pepper.
pub struct RefreshTokenHasher {
    pepper: String,
}

impl RefreshTokenHasher {
    /// A blank pepper is a configuration fault and must stop startup.
    pub fn new(pepper: &str) -> Result<Self, AuthError> {
        if pepper.trim().is_empty() {
            return Err(AuthError::Internal(
                "refresh token pepper must be configured".into(),
            ));
        }
        Ok(Self {
            pepper: pepper.to_string(),
        })
    }

    /// Lowercase-hex SHA-256 digest of the peppered token.
    pub fn hash(&self, refresh_token: &str) -> Result<String, AuthError> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidRefreshToken);
        }
        let mut hasher = Sha256::new();
        hasher.update(self.pepper.as_bytes());
        hasher.update(b".");
        hasher.update(refresh_token.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}
