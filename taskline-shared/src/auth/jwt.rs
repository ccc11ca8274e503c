/// JWT token generation and validation
///
/// Tokens are signed with HS256 (HMAC-SHA256) and carry the subject
/// (user email), role, and token kind as claims.
///
/// # Token Kinds
///
/// - **Access Token**: short-lived (15 minutes), presented as a bearer
///   credential on every authenticated request
/// - **Refresh Token**: long-lived (7 days), exchanged for a new pair;
///   additionally tracked by the refresh-token registry
///
/// Swapping the secret (or the algorithm inside this module) does not
/// change the public contract: callers only see `issue` and `validate`.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Role;

/// Access token lifetime: 15 minutes.
pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;

/// Refresh token lifetime: 7 days.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Token has expired
    #[error("token has expired")]
    Expired,

    /// Bad signature, malformed payload, or otherwise unusable token
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Failed to sign a new token
    #[error("failed to create token: {0}")]
    Encode(String),
}

/// Token kind claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "ACCESS",
            TokenKind::Refresh => "REFRESH",
        }
    }
}

/// Claims carried by every Taskline token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject - user email
    pub sub: String,

    /// Role held by the user when the token was issued
    pub role: Role,

    /// Access or refresh token
    pub kind: TokenKind,

    /// Unique token ID; two tokens issued in the same second still differ
    pub jti: Uuid,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Issues and validates signed tokens against a single shared secret.
///
/// The codec is cheap to clone and holds process-wide configuration
/// (secret and per-kind TTLs).
#[derive(Clone)]
pub struct TokenCodec {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Creates a codec with the default TTLs (15 minutes / 7 days).
    pub fn new(secret: impl Into<String>) -> Self {
        Self::with_ttls(
            secret,
            Duration::minutes(ACCESS_TOKEN_TTL_MINUTES),
            Duration::days(REFRESH_TOKEN_TTL_DAYS),
        )
    }

    /// Creates a codec with custom TTLs (used by tests and configuration).
    pub fn with_ttls(secret: impl Into<String>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Issues a signed token for `subject` with the given role and kind.
    pub fn issue(&self, subject: &str, role: Role, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: subject.to_string(),
            role,
            kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.ttl(kind)).timestamp(),
        };

        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(self.secret.as_bytes());

        encode(&header, &claims, &key).map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verifies signature and expiry and returns the decoded claims.
    ///
    /// Bad signature, malformed payload, and past expiry all surface as
    /// a typed [`TokenError`]; this never panics on untrusted input.
    pub fn validate(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<TokenClaims>(token, &key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })?;

        Ok(data.claims)
    }

    /// Extracts the subject without verifying signature or expiry.
    ///
    /// Used by logout only, which removes the registry entry for the
    /// subject regardless of token validity. Returns `None` when the
    /// payload cannot be decoded at all.
    pub fn decode_subject_unverified(&self, token: &str) -> Option<String> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<TokenClaims>(token, &key, &validation)
            .ok()
            .map(|data| data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret-key-at-least-32-bytes-long")
    }

    #[test]
    fn test_issue_and_validate() {
        let codec = codec();
        let token = codec
            .issue("user@example.com", Role::Viewer, TokenKind::Access)
            .unwrap();

        let claims = codec.validate(&token).unwrap();
        assert_eq!(claims.sub, "user@example.com");
        assert_eq!(claims.role, Role::Viewer);
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_tokens_issued_back_to_back_are_distinct() {
        let codec = codec();
        let a = codec
            .issue("user@example.com", Role::Viewer, TokenKind::Refresh)
            .unwrap();
        let b = codec
            .issue("user@example.com", Role::Viewer, TokenKind::Refresh)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_access_and_refresh_ttls_differ() {
        let codec = codec();
        let access = codec
            .issue("a@example.com", Role::Admin, TokenKind::Access)
            .unwrap();
        let refresh = codec
            .issue("a@example.com", Role::Admin, TokenKind::Refresh)
            .unwrap();

        let access_claims = codec.validate(&access).unwrap();
        let refresh_claims = codec.validate(&refresh).unwrap();
        assert!(refresh_claims.exp > access_claims.exp);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = codec()
            .issue("user@example.com", Role::Viewer, TokenKind::Access)
            .unwrap();

        let other = TokenCodec::new("another-secret-key-that-is-long-enough");
        assert!(matches!(other.validate(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_validate_expired_token() {
        let codec = TokenCodec::with_ttls(
            "test-secret-key-at-least-32-bytes-long",
            Duration::seconds(-3600),
            Duration::seconds(-3600),
        );
        let token = codec
            .issue("user@example.com", Role::Viewer, TokenKind::Access)
            .unwrap();

        assert!(matches!(codec.validate(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_validate_malformed_token() {
        let codec = codec();
        assert!(matches!(codec.validate("not-a-token"), Err(TokenError::Invalid(_))));
        assert!(matches!(codec.validate(""), Err(TokenError::Invalid(_))));
        assert!(matches!(codec.validate("a.b.c"), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_decode_subject_unverified() {
        let codec = codec();
        let token = codec
            .issue("user@example.com", Role::Developer, TokenKind::Refresh)
            .unwrap();

        // Works even with a codec holding a different secret
        let other = TokenCodec::new("another-secret-key-that-is-long-enough");
        assert_eq!(
            other.decode_subject_unverified(&token).as_deref(),
            Some("user@example.com")
        );

        assert_eq!(codec.decode_subject_unverified("garbage"), None);
    }

    #[test]
    fn test_decode_subject_unverified_expired() {
        let expired = TokenCodec::with_ttls(
            "test-secret-key-at-least-32-bytes-long",
            Duration::seconds(-60),
            Duration::seconds(-60),
        );
        let token = expired
            .issue("gone@example.com", Role::Viewer, TokenKind::Refresh)
            .unwrap();

        assert_eq!(
            expired.decode_subject_unverified(&token).as_deref(),
            Some("gone@example.com")
        );
    }
}
