/// Auth orchestration: register, login, refresh, logout
///
/// Built on three collaborators:
///
/// - a [`UserStore`] for lookup and creation of accounts,
/// - the [`TokenCodec`] for issuing/validating signed tokens,
/// - a [`RefreshTokenStore`] tracking the single live refresh token
///   per user.
///
/// The only session state is "has / has not a live refresh token".
/// Logging in again, refreshing, or logging out all replace or drop
/// that one registry entry, so a user has at most one active session.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::jwt::{TokenCodec, TokenError, TokenKind};
use super::password::{self, PasswordError};
use super::refresh_store::RefreshTokenStore;
use crate::models::user::{NewUser, Role, User};

/// Error type for auth flows.
///
/// The first group are expected domain failures translated to client
/// errors by the API layer; the rest are internal.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("email already in use")]
    EmailInUse,

    #[error("user not found")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("refresh token is invalid or expired")]
    InvalidToken,

    #[error("token is not a refresh token")]
    WrongKind,

    #[error("refresh token is not authorized")]
    NotAuthorized,

    #[error("user no longer exists")]
    UserGone,

    #[error("password hashing failed")]
    Password(#[from] PasswordError),

    #[error("token issuance failed")]
    Issue(#[source] TokenError),

    #[error("user store error")]
    Store(#[source] anyhow::Error),
}

/// A freshly issued access/refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// User lookup/creation seam for the auth service.
///
/// The production implementation is backed by Postgres
/// (`models::user::PgUserStore`); tests use an in-memory store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact-match lookup on the stored email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error>;

    /// Inserts a new user and returns the stored row.
    async fn insert(&self, data: NewUser) -> Result<User, anyhow::Error>;
}

/// Orchestrates the token lifecycle for user sessions.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    codec: TokenCodec,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        codec: TokenCodec,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            codec,
        }
    }

    /// The codec used for issuing tokens (shared with the API middleware).
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    fn issue_pair(&self, email: &str, role: Role) -> Result<TokenPair, AuthError> {
        let access_token = self
            .codec
            .issue(email, role, TokenKind::Access)
            .map_err(AuthError::Issue)?;
        let refresh_token = self
            .codec
            .issue(email, role, TokenKind::Refresh)
            .map_err(AuthError::Issue)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Registers a new account with role VIEWER (least privilege) and
    /// returns a first token pair.
    ///
    /// Fails with [`AuthError::EmailInUse`] when the email already
    /// exists (exact match on the stored value). The plaintext password
    /// is hashed immediately and never logged.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<TokenPair, AuthError> {
        if self
            .users
            .find_by_email(email)
            .await
            .map_err(AuthError::Store)?
            .is_some()
        {
            warn!(email, "registration attempt with existing email");
            return Err(AuthError::EmailInUse);
        }

        let password_hash = password::hash_password(password)?;

        let user = self
            .users
            .insert(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                role: Role::Viewer,
            })
            .await
            .map_err(AuthError::Store)?;

        let pair = self.issue_pair(&user.email, user.role)?;
        self.refresh_tokens.put(&user.email, &pair.refresh_token);

        info!(user_id = %user.id, "user registered");
        Ok(pair)
    }

    /// Authenticates by email/password and issues a fresh token pair.
    ///
    /// The new refresh token overwrites any previous registry entry, so
    /// logging in elsewhere silently revokes the old session.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::NotFound)?;

        if !password::verify_password(password, &user.password_hash)? {
            warn!(email, "login with invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issue_pair(&user.email, user.role)?;
        self.refresh_tokens.put(&user.email, &pair.refresh_token);

        info!(user_id = %user.id, "user logged in");
        Ok(pair)
    }

    /// Exchanges a refresh token for a new pair, rotating the registry
    /// entry so the presented token becomes permanently unusable.
    ///
    /// A token that still validates cryptographically but has been
    /// superseded (by a later login or refresh) fails the registry
    /// equality check with [`AuthError::NotAuthorized`].
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .codec
            .validate(refresh_token)
            .map_err(|_| AuthError::InvalidToken)?;

        if claims.kind != TokenKind::Refresh {
            return Err(AuthError::WrongKind);
        }

        match self.refresh_tokens.get(&claims.sub) {
            Some(current) if current == refresh_token => {}
            _ => {
                warn!(email = %claims.sub, "refresh with superseded or unknown token");
                return Err(AuthError::NotAuthorized);
            }
        }

        let user = self
            .users
            .find_by_email(&claims.sub)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::UserGone)?;

        let pair = self.issue_pair(&user.email, user.role)?;
        if !self
            .refresh_tokens
            .rotate(&user.email, refresh_token, &pair.refresh_token)
        {
            // Lost a race with a concurrent refresh/login for the same user.
            return Err(AuthError::NotAuthorized);
        }

        Ok(pair)
    }

    /// Drops the registry entry for the token's subject.
    ///
    /// The token is not validated: even an expired or badly signed token
    /// identifies the session to terminate. Idempotent, never fails.
    pub async fn logout(&self, refresh_token: &str) {
        if let Some(subject) = self.codec.decode_subject_unverified(refresh_token) {
            self.refresh_tokens.remove(&subject);
            info!(email = %subject, "user logged out");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::refresh_store::InMemoryRefreshTokenStore;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// In-memory user store for exercising auth flows without a database.
    #[derive(Default)]
    struct MemoryUserStore {
        users: Mutex<HashMap<String, User>>,
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
            Ok(self.users.lock().unwrap().get(email).cloned())
        }

        async fn insert(&self, data: NewUser) -> Result<User, anyhow::Error> {
            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4(),
                name: data.name,
                email: data.email.clone(),
                password_hash: data.password_hash,
                role: data.role,
                created_at: now,
                updated_at: now,
            };
            self.users.lock().unwrap().insert(data.email, user.clone());
            Ok(user)
        }
    }

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryUserStore::default()),
            Arc::new(InMemoryRefreshTokenStore::new()),
            TokenCodec::new("test-secret-key-at-least-32-bytes-long"),
        )
    }

    #[tokio::test]
    async fn test_register_then_login_with_viewer_role() {
        let svc = service();
        svc.register("Ana", "ana@example.com", "hunter2!")
            .await
            .unwrap();

        let pair = svc.login("ana@example.com", "hunter2!").await.unwrap();
        let claims = svc.codec().validate(&pair.access_token).unwrap();
        assert_eq!(claims.role, Role::Viewer);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.sub, "ana@example.com");
    }

    #[tokio::test]
    async fn test_register_duplicate_email_fails() {
        let svc = service();
        svc.register("Ana", "ana@example.com", "hunter2!")
            .await
            .unwrap();

        let err = svc
            .register("Other", "ana@example.com", "different-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailInUse));
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_not_found() {
        let svc = service();
        let err = svc.login("nobody@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_invalid_credentials() {
        let svc = service();
        svc.register("Ana", "ana@example.com", "hunter2!")
            .await
            .unwrap();

        let err = svc.login("ana@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_refresh_with_access_token_is_wrong_kind() {
        let svc = service();
        let pair = svc
            .register("Ana", "ana@example.com", "hunter2!")
            .await
            .unwrap();

        let err = svc.refresh(&pair.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::WrongKind));
    }

    #[tokio::test]
    async fn test_refresh_rotation_invalidates_prior_token() {
        let svc = service();
        svc.register("Ana", "ana@example.com", "hunter2!")
            .await
            .unwrap();

        let r1 = svc
            .login("ana@example.com", "hunter2!")
            .await
            .unwrap()
            .refresh_token;

        // First use succeeds
        let rotated = svc.refresh(&r1).await.unwrap();
        assert_ne!(rotated.refresh_token, r1);

        // Second use of the same token fails: rotation is at-most-once
        let err = svc.refresh(&r1).await.unwrap_err();
        assert!(matches!(err, AuthError::NotAuthorized));

        // The rotated token still works
        svc.refresh(&rotated.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_login_elsewhere_revokes_previous_refresh_token() {
        let svc = service();
        svc.register("Ana", "ana@example.com", "hunter2!")
            .await
            .unwrap();

        let first = svc.login("ana@example.com", "hunter2!").await.unwrap();
        let second = svc.login("ana@example.com", "hunter2!").await.unwrap();

        let err = svc.refresh(&first.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::NotAuthorized));
        svc.refresh(&second.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_logout_then_refresh_is_not_authorized() {
        let svc = service();
        let pair = svc
            .register("Ana", "ana@example.com", "hunter2!")
            .await
            .unwrap();

        svc.logout(&pair.refresh_token).await;

        let err = svc.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::NotAuthorized));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent_and_tolerates_garbage() {
        let svc = service();
        let pair = svc
            .register("Ana", "ana@example.com", "hunter2!")
            .await
            .unwrap();

        svc.logout(&pair.refresh_token).await;
        svc.logout(&pair.refresh_token).await;
        svc.logout("not-a-token").await;
    }

    #[tokio::test]
    async fn test_refresh_garbage_token_is_invalid() {
        let svc = service();
        let err = svc.refresh("garbage").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }
}
