pub mod account_service;
pub mod session_issuer;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::auth::{AuthService, CsrfService, TokenIssuer};
use crate::config::Settings;
use crate::repository::*;
use account_service::AccountService;
use session_issuer::SessionIssuer;

pub struct ServiceContext {
    pub account_repo: Arc<dyn AccountRepository>,
    pub announcement_repo: Arc<dyn AnnouncementRepository>,
    pub account_service: Arc<AccountService>,
    pub session_issuer: Arc<SessionIssuer>,
    pub auth_service: Arc<AuthService>,
    pub csrf_service: Arc<CsrfService>,
    pub token_issuer: Arc<TokenIssuer>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool, settings: &Settings) -> Self {
        let account_repo: Arc<dyn AccountRepository> =
            Arc::new(SqliteAccountRepository::new(db_pool.clone()));
        let announcement_repo: Arc<dyn AnnouncementRepository> =
            Arc::new(SqliteAnnouncementRepository::new(db_pool.clone()));

        let auth_service = Arc::new(AuthService::new(
            db_pool.clone(),
            settings.auth.session_duration_hours,
            !settings.server.debug,
        ));
        let csrf_service = Arc::new(CsrfService::new(db_pool.clone()));
        let token_issuer = Arc::new(TokenIssuer::new(&settings.auth));

        let account_service = Arc::new(AccountService::new(account_repo.clone()));
        let session_issuer = Arc::new(SessionIssuer::new(
            account_repo.clone(),
            token_issuer.clone(),
        ));

        Self {
            account_repo,
            announcement_repo,
            account_service,
            session_issuer,
            auth_service,
            csrf_service,
            token_issuer,
            db_pool,
        }
    }
}
