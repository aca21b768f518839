use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::{password_policy, AuthService},
    domain::*,
    error::{AppError, Result},
    repository::AccountRepository,
};

pub struct AccountService {
    repo: Arc<dyn AccountRepository>,
}

#[derive(Debug, Clone)]
pub struct DashboardStats {
    pub counts: AccountCounts,
    pub recent: Vec<Account>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn AccountRepository>) -> Self {
        Self { repo }
    }

    /// Username is checked before email; the first duplicate found is the
    /// one reported and nothing is written.
    pub async fn create_account(&self, request: CreateAccountRequest) -> Result<Account> {
        let request = CreateAccountRequest {
            username: request.username.trim().to_string(),
            email: request.email.trim().to_string(),
            ..request
        };

        if request.username.is_empty() {
            return Err(AppError::Validation("Username is required.".to_string()));
        }
        if request.email.is_empty() {
            return Err(AppError::Validation("Email is required.".to_string()));
        }
        if request.password.is_empty() {
            return Err(AppError::Validation("Password is required.".to_string()));
        }

        if self.repo.username_exists(&request.username).await? {
            return Err(AppError::Validation("Username already exists!".to_string()));
        }

        if self.repo.email_exists(&request.email).await? {
            return Err(AppError::Validation("Email already exists!".to_string()));
        }

        self.repo.create(request).await
    }

    /// Loads the account `requester` wants to delete and applies the tiered
    /// deletion rule without deleting anything.
    pub async fn deletion_target(&self, requester: &Account, id: Uuid) -> Result<Account> {
        let target = self.repo.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        check_deletion(requester.role, target.role)
            .map_err(|denied| AppError::PermissionDenied(denied.message().to_string()))?;

        Ok(target)
    }

    pub async fn delete_account(&self, requester: &Account, id: Uuid) -> Result<Account> {
        let target = self.deletion_target(requester, id).await?;

        self.repo.delete(target.id).await?;

        tracing::info!(
            "Account {} deleted by {}",
            target.username,
            requester.username
        );

        Ok(target)
    }

    /// The current password is checked first; strength rules only apply once
    /// it matches. Success clears the must-change-password flag.
    pub async fn change_password(
        &self,
        account: &Account,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let hash = self.repo.password_hash(account.id).await?
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

        if !AuthService::verify_password(current_password, &hash).await? {
            return Err(AppError::BadRequest("Current password is incorrect.".to_string()));
        }

        let problems = password_policy::validate(
            new_password,
            &[("username", &account.username), ("email", &account.email)],
        );
        if !problems.is_empty() {
            return Err(AppError::PasswordRejected(problems));
        }

        let new_hash = AuthService::hash_password(new_password).await?;
        self.repo.set_password(account.id, &new_hash).await?;

        tracing::info!("Password changed for {}", account.username);

        Ok(())
    }

    pub async fn dashboard_stats(&self, recent: i64) -> Result<DashboardStats> {
        Ok(DashboardStats {
            counts: self.repo.counts().await?,
            recent: self.repo.list(recent, 0).await?,
        })
    }

    pub async fn page(&self, page: i64, per_page: i64) -> Result<AccountPage> {
        let counts = self.repo.counts().await?;
        let per_page = per_page.max(1);
        let total_pages = ((counts.total + per_page - 1) / per_page).max(1);
        let current_page = page.clamp(1, total_pages);

        let accounts = self.repo
            .list(per_page, (current_page - 1) * per_page)
            .await?;

        Ok(AccountPage {
            accounts,
            counts,
            current_page,
            total_pages,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AccountPage {
    pub accounts: Vec<Account>,
    pub counts: AccountCounts,
    pub current_page: i64,
    pub total_pages: i64,
}

impl AccountPage {
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}
