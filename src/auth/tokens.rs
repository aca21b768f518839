//! Signed access/refresh tokens for the mobile API.
//!
//! Tokens are HS256 JWTs checked by signature and expiry only; there is no
//! server-side record of issued tokens, so they cannot be revoked before
//! they expire.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    domain::{Account, Role},
    error::{AppError, Result},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    pub fn account_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Unauthorized)
    }
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            validation,
            access_lifetime_secs: config.access_token_lifetime_secs,
            refresh_lifetime_secs: config.refresh_token_lifetime_secs,
        }
    }

    pub fn issue_pair(&self, account: &Account) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.issue(account, TokenType::Access)?,
            refresh: self.issue(account, TokenType::Refresh)?,
        })
    }

    pub fn issue(&self, account: &Account, token_type: TokenType) -> Result<String> {
        let now = Utc::now().timestamp();
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime_secs,
            TokenType::Refresh => self.refresh_lifetime_secs,
        };

        let claims = Claims {
            sub: account.id.to_string(),
            username: account.username.clone(),
            role: account.role,
            token_type,
            iat: now,
            exp: now + lifetime,
            jti: Uuid::new_v4().simple().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Decodes `token` and checks that it is of the `expected` kind.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            AppError::Unauthorized
        })?;

        if data.claims.token_type != expected {
            tracing::debug!("Rejected token: expected {:?}, got {:?}", expected, data.claims.token_type);
            return Err(AppError::Unauthorized);
        }

        Ok(data.claims)
    }
}
