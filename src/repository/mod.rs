use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod account_repository;
pub mod announcement_repository;

pub use account_repository::SqliteAccountRepository;
pub use announcement_repository::SqliteAnnouncementRepository;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Creates the account and its profile in one transaction.
    async fn create(&self, account: CreateAccountRequest) -> Result<Account>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>>;
    async fn username_exists(&self, username: &str) -> Result<bool>;
    async fn email_exists(&self, email: &str) -> Result<bool>;
    async fn password_hash(&self, id: Uuid) -> Result<Option<String>>;
    async fn profile(&self, id: Uuid) -> Result<Option<Profile>>;
    /// Newest first.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Account>>;
    async fn list_all(&self) -> Result<Vec<Account>>;
    async fn counts(&self) -> Result<AccountCounts>;
    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<()>;
    async fn record_login(&self, id: Uuid) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn create(&self, announcement: NewAnnouncement) -> Result<Announcement>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Announcement>>;
    async fn latest_active(&self) -> Result<Option<Announcement>>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<Announcement>;
}
