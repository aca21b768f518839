use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::{
    auth::{AuthService, TokenIssuer, TokenPair, TokenType},
    domain::Account,
    error::{AppError, Result},
    repository::AccountRepository,
};

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub account: Account,
    pub tokens: TokenPair,
    pub must_change_password: bool,
}

/// Resolves login identifiers, verifies credentials and mints API tokens.
pub struct SessionIssuer {
    repo: Arc<dyn AccountRepository>,
    tokens: Arc<TokenIssuer>,
    /// Verified against when no usable account matches, so every failed
    /// login costs one argon2 verification.
    dummy_hash: OnceCell<String>,
}

impl SessionIssuer {
    pub fn new(repo: Arc<dyn AccountRepository>, tokens: Arc<TokenIssuer>) -> Self {
        Self {
            repo,
            tokens,
            dummy_hash: OnceCell::new(),
        }
    }

    async fn dummy_hash(&self) -> Result<&str> {
        let hash = self.dummy_hash
            .get_or_try_init(|| AuthService::hash_password("beacon-unusable-password"))
            .await?;
        Ok(hash.as_str())
    }

    /// An identifier matching an email resolves to that account's username;
    /// anything else is taken as a username.
    pub async fn resolve(&self, identifier: &str) -> Result<Option<Account>> {
        let username = match self.repo.find_by_email(identifier).await? {
            Some(account) => account.username,
            None => identifier.to_string(),
        };

        self.repo.find_by_username(&username).await
    }

    /// Every failure (unknown identifier, inactive account, wrong password)
    /// is the same `InvalidCredentials` error.
    /// Unknown and inactive accounts still pay for a password verification.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> Result<Account> {
        let account = self.resolve(identifier.trim()).await?
            .filter(|account| account.is_active);

        let stored_hash = match &account {
            Some(account) => self.repo.password_hash(account.id).await?,
            None => None,
        };

        let (Some(account), Some(hash)) = (account, stored_hash) else {
            let dummy = self.dummy_hash().await?;
            let _ = AuthService::verify_password(password, dummy).await?;
            return Err(AppError::InvalidCredentials);
        };

        if !AuthService::verify_password(password, &hash).await? {
            tracing::debug!("Password mismatch for {}", account.username);
            return Err(AppError::InvalidCredentials);
        }

        Ok(account)
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginOutcome> {
        let account = self.authenticate(identifier, password).await?;

        let tokens = self.tokens.issue_pair(&account)?;
        let must_change_password = self.repo.profile(account.id).await?
            .map(|profile| profile.must_change_password)
            .unwrap_or(false);

        self.repo.record_login(account.id).await?;

        tracing::info!("Issued tokens for {}", account.username);

        Ok(LoginOutcome {
            account,
            tokens,
            must_change_password,
        })
    }

    /// New access token for a still-existing, active account.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let claims = self.tokens.verify(refresh_token, TokenType::Refresh)?;

        let account = self.repo.find_by_id(claims.account_id()?).await?
            .filter(|account| account.is_active)
            .ok_or(AppError::Unauthorized)?;

        self.tokens.issue(&account, TokenType::Access)
    }
}
