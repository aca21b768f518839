use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    domain::PasswordInput,
    error::{AppError, Result},
};

pub mod csrf;
pub mod password_policy;
pub mod session;
pub mod tokens;

use session::{Session, SessionStore};
pub use csrf::CsrfService;
pub use tokens::{Claims, TokenIssuer, TokenPair, TokenType};

pub const SESSION_COOKIE: &str = "console_session";
pub const LOGIN_CSRF_COOKIE: &str = "login_csrf";

/// Console session handling plus the password primitives shared by the API.
pub struct AuthService {
    session_store: SessionStore,
    session_duration_hours: i64,
    secure_cookies: bool,
}

impl AuthService {
    pub fn new(pool: SqlitePool, session_duration_hours: i64, secure_cookies: bool) -> Self {
        Self {
            session_store: SessionStore::new(pool),
            session_duration_hours,
            secure_cookies,
        }
    }

    pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        let argon2 = Argon2::default();

        Ok(argon2.verify_password(password.as_bytes(), &parsed_hash).is_ok())
    }

    pub async fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    pub async fn create_session(&self, account_id: Uuid) -> Result<(Session, String)> {
        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(self.session_duration_hours);

        let session = self.session_store
            .create(account_id, &token, expires_at)
            .await?;

        Ok((session, token))
    }

    pub async fn validate_session(&self, token: &str) -> Result<Option<Session>> {
        self.session_store.find_by_token(token).await
    }

    pub async fn invalidate_session(&self, token: &str) -> Result<()> {
        self.session_store.delete_by_token(token).await
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64> {
        self.session_store.cleanup_expired().await
    }

    pub fn create_session_cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token.to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(self.secure_cookies)
            .max_age(cookie::time::Duration::hours(self.session_duration_hours))
            .build()
    }

    pub fn create_logout_cookie() -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(cookie::time::Duration::seconds(0))
            .build()
    }

    /// Pre-session CSRF cookie for the login form. The form echoes the
    /// same value back in a hidden field.
    pub fn create_login_csrf_cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build((LOGIN_CSRF_COOKIE, token.to_string()))
            .path("/")
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(self.secure_cookies)
            .max_age(cookie::time::Duration::minutes(30))
            .build()
    }

    pub fn clear_login_csrf_cookie() -> Cookie<'static> {
        Cookie::build((LOGIN_CSRF_COOKIE, ""))
            .path("/")
            .max_age(cookie::time::Duration::seconds(0))
            .build()
    }
}

/// Compares the login form token against its cookie. Both sides are hashed
/// before comparing.
pub fn login_csrf_matches(cookie_token: Option<&str>, submitted: &str) -> bool {
    match cookie_token {
        Some(expected) if !expected.is_empty() && !submitted.is_empty() => {
            hash_token(expected) == hash_token(submitted)
        }
        _ => false,
    }
}

/// Hash to store for a new account. Plain input is always hashed; pre-hashed
/// input must be an argon2 PHC string.
pub async fn password_hash_for(input: &PasswordInput) -> Result<String> {
    match input {
        PasswordInput::Plain(password) => AuthService::hash_password(password).await,
        PasswordInput::Hashed(hash) if is_argon2_hash(hash) => Ok(hash.clone()),
        PasswordInput::Hashed(_) => Err(AppError::Validation(
            "Password hash must be an argon2 PHC string.".to_string(),
        )),
    }
}

pub fn is_argon2_hash(value: &str) -> bool {
    PasswordHash::new(value)
        .map(|hash| hash.algorithm.as_str().starts_with("argon2"))
        .unwrap_or(false)
}

pub(crate) fn generate_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_password_gets_hashed() {
        let stored = password_hash_for(&PasswordInput::plain("plain-secret")).await.unwrap();
        assert_ne!(stored, "plain-secret");
        assert!(is_argon2_hash(&stored));
        assert!(AuthService::verify_password("plain-secret", &stored).await.unwrap());
    }

    #[tokio::test]
    async fn test_plain_input_that_looks_hashed_is_still_hashed() {
        let typed = AuthService::hash_password("something-else").await.unwrap();
        let stored = password_hash_for(&PasswordInput::Plain(typed.clone())).await.unwrap();
        assert_ne!(stored, typed);
        assert!(AuthService::verify_password(&typed, &stored).await.unwrap());
    }

    #[tokio::test]
    async fn test_prehashed_input_is_kept() {
        let hash = AuthService::hash_password("already-hashed").await.unwrap();
        let stored = password_hash_for(&PasswordInput::Hashed(hash.clone())).await.unwrap();
        assert_eq!(stored, hash);
    }

    #[tokio::test]
    async fn test_prehashed_input_must_be_argon2() {
        let err = password_hash_for(&PasswordInput::Hashed("plain".to_string())).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_foreign_phc_string_is_not_argon2() {
        assert!(!is_argon2_hash("pbkdf2_sha256$260000$salt$hash"));
        assert!(!is_argon2_hash(""));
    }

    #[test]
    fn test_login_csrf_requires_matching_cookie() {
        let token = generate_token();
        assert!(login_csrf_matches(Some(&token), &token));
        assert!(!login_csrf_matches(Some(&token), &generate_token()));
        assert!(!login_csrf_matches(None, &token));
        assert!(!login_csrf_matches(Some(""), ""));
    }

    #[test]
    fn test_token_generation() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_token_hashing() {
        let hash1 = hash_token("test_token");
        let hash2 = hash_token("test_token");
        assert_eq!(hash1, hash2);
        assert_ne!(hash1, "test_token");
    }
}
