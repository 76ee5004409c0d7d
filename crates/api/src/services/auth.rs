//! Authentication service: accounts, token sessions and password reset.

use chrono::{Duration, Utc};
use domain::models::user::UserProfile;
use domain::models::User;
use persistence::repositories::UserRepository;
use shared::crypto::{generate_secure_token, sha256_hex};
use shared::jwt::{JwtConfig, JwtError, TokenPair};
use shared::password::{check_password_strength, hash_password, verify_password, PasswordError};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::PasswordResetConfig;
use crate::services::unique_violation;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email already registered")]
    EmailTaken,

    #[error("{0}")]
    WeakPassword(&'static str),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Password error: {0}")]
    Password(PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooWeak(reason) => AuthError::WeakPassword(reason),
            other => AuthError::Password(other),
        }
    }
}

/// Tokens handed to a client after signup, login or refresh.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Result of a successful signup or login.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: UserProfile,
    pub tokens: IssuedTokens,
}

/// Authentication service.
pub struct AuthService {
    pool: PgPool,
    users: UserRepository,
    jwt: Arc<JwtConfig>,
    reset_token_ttl_secs: i64,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>, reset: &PasswordResetConfig) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            pool,
            jwt,
            reset_token_ttl_secs: reset.token_ttl_secs,
        }
    }

    /// Create an account and open a first session for it.
    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResult, AuthError> {
        check_password_strength(password)?;
        let password_hash = hash_password(password)?;
        let email = email.trim().to_lowercase();

        // Friendly errors for the common case; the unique constraints still
        // decide concurrent signups below.
        if self.users.find_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let user: User = match self.users.create_user(username, &email, &password_hash).await {
            Ok(entity) => entity.into(),
            Err(e) => {
                return Err(match unique_violation(&e) {
                    Some("users_username_key") => AuthError::UsernameTaken,
                    Some("users_email_key") => AuthError::EmailTaken,
                    _ => e.into(),
                })
            }
        };

        let tokens = self.open_session(user.id).await?;
        tracing::info!(user_id = %user.id, "User signed up");

        Ok(AuthResult {
            user: user.into(),
            tokens,
        })
    }

    /// Check a username/password pair. `None` when either is wrong.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AuthError> {
        let Some(entity) = self.users.find_by_username(username).await? else {
            return Ok(None);
        };

        if verify_password(password, &entity.password_hash)? {
            Ok(Some(entity.into()))
        } else {
            Ok(None)
        }
    }

    /// Authenticate and issue a token pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResult, AuthError> {
        let user = self
            .authenticate(username, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let tokens = self.open_session(user.id).await?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthResult {
            user: user.into(),
            tokens,
        })
    }

    /// Exchange a refresh token for a new pair. The old refresh token stops
    /// working.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedTokens, AuthError> {
        let claims = self.refresh_claims(refresh_token)?;
        let user_id = claims.user_id().map_err(|_| AuthError::InvalidRefreshToken)?;

        let old_hash = sha256_hex(&claims.jti);
        let session = self
            .users
            .find_session_by_refresh_hash(&old_hash, user_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if session.expires_at < Utc::now() {
            self.users.delete_session(session.id).await?;
            return Err(AuthError::InvalidRefreshToken);
        }

        let pair = self.jwt.issue_pair(user_id)?;
        let rotated = self
            .users
            .rotate_session(
                session.id,
                &old_hash,
                &sha256_hex(&pair.access_jti),
                &sha256_hex(&pair.refresh_jti),
                self.session_expiry(),
            )
            .await?;
        if !rotated {
            // Another refresh with the same token won the race.
            return Err(AuthError::SessionNotFound);
        }

        tracing::debug!(user_id = %user_id, session_id = %session.id, "Session rotated");
        Ok(self.issued(pair))
    }

    /// Invalidate the session a refresh token belongs to. The token must
    /// have been issued to `user_id`.
    pub async fn logout(&self, user_id: Uuid, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self.refresh_claims(refresh_token)?;
        if claims.user_id().ok() != Some(user_id) {
            return Err(AuthError::InvalidRefreshToken);
        }

        match self
            .users
            .find_session_by_refresh_hash(&sha256_hex(&claims.jti), user_id)
            .await?
        {
            Some(session) => {
                self.users.delete_session(session.id).await?;
                tracing::info!(user_id = %user_id, "User logged out");
            }
            None => {
                tracing::debug!(user_id = %user_id, "Session not found during logout, may already be logged out");
            }
        }
        Ok(())
    }

    /// The caller's own profile.
    pub async fn me(&self, user_id: Uuid) -> Result<UserProfile, AuthError> {
        let user: User = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?
            .into();
        Ok(user.into())
    }

    /// Issue a reset token for the account with this email.
    ///
    /// Unknown emails succeed silently so accounts cannot be enumerated. The
    /// token is returned for out-of-band delivery and never logged.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthError> {
        let Some(user) = self.users.find_by_email(&email.trim().to_lowercase()).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(None);
        };

        let token = generate_secure_token();
        let expires_at = Utc::now() + Duration::seconds(self.reset_token_ttl_secs);
        self.users
            .replace_reset_token(user.id, &sha256_hex(&token), expires_at)
            .await?;

        tracing::info!(user_id = %user.id, "Password reset token issued");
        Ok(Some(token))
    }

    /// Consume a reset token: set the new password, burn the token and drop
    /// every session of the user, all in one transaction.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        check_password_strength(new_password)?;
        let password_hash = hash_password(new_password)?;

        let mut tx = self.pool.begin().await?;

        let reset = UserRepository::lock_reset_token(&mut *tx, &sha256_hex(token))
            .await?
            .filter(|t| t.is_redeemable(Utc::now()))
            .ok_or(AuthError::InvalidResetToken)?;

        UserRepository::set_password(&mut *tx, reset.user_id, &password_hash).await?;
        UserRepository::mark_reset_token_used(&mut *tx, reset.id).await?;
        let dropped = UserRepository::delete_user_sessions(&mut *tx, reset.user_id).await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %reset.user_id,
            sessions_dropped = dropped,
            "Password reset, all sessions invalidated"
        );
        Ok(())
    }

    fn refresh_claims(&self, refresh_token: &str) -> Result<shared::jwt::Claims, AuthError> {
        self.jwt
            .validate_refresh_token(refresh_token)
            .map_err(|e| match e {
                JwtError::TokenExpired | JwtError::InvalidToken | JwtError::DecodingError(_) => {
                    AuthError::InvalidRefreshToken
                }
                other => AuthError::Token(other),
            })
    }

    async fn open_session(&self, user_id: Uuid) -> Result<IssuedTokens, AuthError> {
        let pair = self.jwt.issue_pair(user_id)?;
        self.users
            .create_session(
                user_id,
                &sha256_hex(&pair.access_jti),
                &sha256_hex(&pair.refresh_jti),
                self.session_expiry(),
            )
            .await?;
        Ok(self.issued(pair))
    }

    fn session_expiry(&self) -> chrono::DateTime<Utc> {
        Utc::now() + Duration::seconds(self.jwt.refresh_token_expiry_secs)
    }

    fn issued(&self, pair: TokenPair) -> IssuedTokens {
        IssuedTokens {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: self.jwt.access_token_expiry_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weak_password_maps_to_reason() {
        let err: AuthError = PasswordError::TooWeak("Password must contain a digit").into();
        assert!(matches!(err, AuthError::WeakPassword(r) if r.contains("digit")));
    }

    #[test]
    fn test_hash_failures_stay_internal() {
        let err: AuthError = PasswordError::InvalidHashFormat.into();
        assert!(matches!(err, AuthError::Password(_)));
    }

    #[test]
    fn test_auth_error_messages() {
        assert_eq!(AuthError::UsernameTaken.to_string(), "Username already taken");
        assert_eq!(
            AuthError::InvalidResetToken.to_string(),
            "Invalid or expired reset token"
        );
    }
}
