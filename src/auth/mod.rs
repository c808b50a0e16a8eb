//! Cookie-based sessions for the HTML interface.
//!
//! A session token is `"{user_id}.{expiry_unix}.{hex(hmac)}"` where the
//! HMAC-SHA256 covers `"{user_id}.{expiry_unix}"` and is keyed with the
//! configured session secret. No session state is stored server-side.

use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    entities::user::{self, Entity as User},
    errors::ServiceError,
};
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use sha2::Sha256;
use tracing::{info, instrument, warn};

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "magazzino_session";

/// Service for user credentials and signed session tokens
pub struct AuthService {
    db_pool: Arc<DbPool>,
    secret: Vec<u8>,
    ttl_secs: u64,
}

impl AuthService {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            db_pool,
            secret: config.session_secret.as_bytes().to_vec(),
            ttl_secs: config.session_ttl_secs,
        }
    }

    fn hash_password(password: &str) -> Result<String, ServiceError> {
        bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| ServiceError::AuthError(format!("Password hashing failed: {}", e)))
    }

    fn verify_password(password: &str, hash: &str) -> Result<bool, ServiceError> {
        bcrypt::verify(password, hash)
            .map_err(|e| ServiceError::AuthError(format!("Password verification failed: {}", e)))
    }

    fn sign(&self, payload: &str) -> Result<String, ServiceError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| ServiceError::InternalError("Invalid session secret".to_string()))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verifies email and password, returning the user on success. The
    /// failure message is the same for unknown email and wrong password.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<user::Model, ServiceError> {
        let email = email.trim().to_lowercase();
        let user = User::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let user = match user {
            Some(user) => user,
            None => {
                warn!(email = %email, "Login attempt for unknown email");
                return Err(ServiceError::AuthError("Invalid credentials".to_string()));
            }
        };

        if !Self::verify_password(password, &user.password_hash)? {
            warn!(user_id = user.id, "Login attempt with wrong password");
            return Err(ServiceError::AuthError("Invalid credentials".to_string()));
        }

        info!(user_id = user.id, "User logged in");
        Ok(user)
    }

    /// Issues a signed session token for the user, valid for the
    /// configured TTL.
    pub fn issue_session(&self, user_id: i32) -> Result<String, ServiceError> {
        let expiry = Utc::now().timestamp() + self.ttl_secs as i64;
        let payload = format!("{}.{}", user_id, expiry);
        let signature = self.sign(&payload)?;
        Ok(format!("{}.{}", payload, signature))
    }

    /// Validates a session token, returning the user id while the token is
    /// well-formed, correctly signed and not expired.
    pub fn verify_session(&self, token: &str) -> Option<i32> {
        let mut parts = token.splitn(3, '.');
        let user_id: i32 = parts.next()?.parse().ok()?;
        let expiry: i64 = parts.next()?.parse().ok()?;
        let signature = parts.next()?;

        if expiry < Utc::now().timestamp() {
            return None;
        }

        let payload = format!("{}.{}", user_id, expiry);
        let expected = hex::decode(signature).ok()?;
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&expected).ok()?;

        Some(user_id)
    }

    /// Creates the bootstrap admin account when no user with that email
    /// exists yet. Called at startup with the configured credentials.
    #[instrument(skip(self, password))]
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<(), ServiceError> {
        let email = email.trim().to_lowercase();
        let existing = User::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Ok(());
        }

        let user = user::ActiveModel {
            email: Set(email.clone()),
            password_hash: Set(Self::hash_password(password)?),
            ..Default::default()
        };
        let created = user
            .insert(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(user_id = created.id, email = %email, "Bootstrap admin created");
        Ok(())
    }
}

/// Extractor that requires a valid session cookie. Handlers taking this
/// argument are only reachable by logged-in users; everyone else is
/// redirected to the login page.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: i32,
}

#[axum::async_trait]
impl FromRequestParts<crate::AppState> for AuthenticatedUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &crate::AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let user_id = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| state.services.auth.verify_session(cookie.value()));

        match user_id {
            Some(user_id) => Ok(AuthenticatedUser { user_id }),
            None => Err(Redirect::to("/login")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AuthService {
        AuthService {
            db_pool: Arc::new(sea_orm::DatabaseConnection::Disconnected),
            secret: b"0123456789abcdef0123456789abcdef".to_vec(),
            ttl_secs: 3600,
        }
    }

    #[test]
    fn session_round_trip() {
        let auth = test_service();
        let token = auth.issue_session(42).unwrap();
        assert_eq!(auth.verify_session(&token), Some(42));
    }

    #[test]
    fn tampered_session_is_rejected() {
        let auth = test_service();
        let token = auth.issue_session(42).unwrap();
        let forged = token.replacen("42.", "1.", 1);
        assert_eq!(auth.verify_session(&forged), None);
        assert_eq!(auth.verify_session("garbage"), None);
    }

    #[test]
    fn expired_session_is_rejected() {
        let auth = AuthService {
            ttl_secs: 0,
            ..test_service()
        };
        let expired = {
            let payload = format!("42.{}", Utc::now().timestamp() - 10);
            let signature = auth.sign(&payload).unwrap();
            format!("{}.{}", payload, signature)
        };
        assert_eq!(auth.verify_session(&expired), None);
    }
}
