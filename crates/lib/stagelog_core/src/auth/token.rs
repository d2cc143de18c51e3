//! Token codec — HS256 signing and verification of access/refresh tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};

use super::AuthError;
use crate::models::auth::{TokenClaims, TokenKind, TokenVerification};

/// Signs and verifies the two token kinds with a single server secret.
/// The secret and both lifetimes are injected at construction; there is
/// no ambient key lookup.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::seconds(access_ttl_secs),
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
        }
    }

    /// Lifetime applied to refresh tokens, also used for the stored
    /// credential's expiry.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue a short-lived access token.
    pub fn issue_access(&self, subject: &str, role: &str) -> Result<String, AuthError> {
        self.issue(subject, role, TokenKind::Access, self.access_ttl)
    }

    /// Issue a refresh token.
    pub fn issue_refresh(&self, subject: &str, role: &str) -> Result<String, AuthError> {
        self.issue(subject, role, TokenKind::Refresh, self.refresh_ttl)
    }

    fn issue(
        &self,
        subject: &str,
        role: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: subject.to_string(),
            role: role.to_string(),
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Token(format!("jwt encode: {e}")))
    }

    /// Classify a presented token. Fails closed: anything that is not a
    /// correctly signed, unexpired token comes back as `Expired` or
    /// `Malformed`, never as `Valid`.
    pub fn verify(&self, token: &str) -> TokenVerification {
        match decode::<TokenClaims>(token, &self.decoding, &Self::validation(true)) {
            Ok(_) => TokenVerification::Valid,
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => TokenVerification::Expired,
                _ => TokenVerification::Malformed,
            },
        }
    }

    /// Extract claims. Works for valid and expired tokens alike (the
    /// signature is still checked); malformed tokens are an error.
    pub fn claims(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<TokenClaims>(token, &self.decoding, &Self::validation(false))
            .map(|data| data.claims)
            .map_err(|e| AuthError::Token(format!("jwt decode: {e}")))
    }

    fn validation(validate_exp: bool) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = validate_exp;
        validation.leeway = 0;
        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-signing-secret";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, 3600, 1_209_600)
    }

    /// Codec whose tokens are already expired when issued.
    fn expired_codec() -> TokenCodec {
        TokenCodec::new(SECRET, -120, -120)
    }

    #[test]
    fn access_token_round_trips() {
        let codec = codec();
        let token = codec.issue_access("alice@example.com", "USER").unwrap();

        assert_eq!(codec.verify(&token), TokenVerification::Valid);
        let claims = codec.claims(&token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.role, "USER");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_carries_refresh_kind() {
        let codec = codec();
        let token = codec.issue_refresh("alice@example.com", "USER").unwrap();

        assert_eq!(codec.verify(&token), TokenVerification::Valid);
        assert_eq!(codec.claims(&token).unwrap().kind, TokenKind::Refresh);
    }

    #[test]
    fn kinds_are_distinguishable() {
        let codec = codec();
        let access = codec.issue_access("a@b.com", "USER").unwrap();
        let refresh = codec.issue_refresh("a@b.com", "USER").unwrap();

        assert_eq!(codec.claims(&access).unwrap().kind, TokenKind::Access);
        assert_ne!(
            codec.claims(&access).unwrap().kind,
            codec.claims(&refresh).unwrap().kind
        );
    }

    #[test]
    fn expired_token_is_classified_expired_but_claims_remain_readable() {
        let codec = expired_codec();
        let token = codec.issue_access("alice@example.com", "USER").unwrap();

        assert_eq!(codec.verify(&token), TokenVerification::Expired);

        let claims = codec.claims(&token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn garbage_is_malformed_and_yields_no_claims() {
        let codec = codec();
        assert_eq!(codec.verify("not-a-token"), TokenVerification::Malformed);
        assert_eq!(codec.verify(""), TokenVerification::Malformed);
        assert!(codec.claims("not-a-token").is_err());
    }

    #[test]
    fn foreign_signature_is_malformed_even_for_claims() {
        let ours = codec();
        let theirs = TokenCodec::new(b"some-other-secret", 3600, 3600);
        let token = theirs.issue_access("mallory@example.com", "USER").unwrap();

        assert_eq!(ours.verify(&token), TokenVerification::Malformed);
        assert!(ours.claims(&token).is_err());
    }

    #[test]
    fn tampered_token_is_malformed() {
        let codec = codec();
        let mut token = codec.issue_access("a@b.com", "USER").unwrap();
        token.push('x');
        assert_eq!(codec.verify(&token), TokenVerification::Malformed);
    }
}
