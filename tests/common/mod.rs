#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use beacon::{
    api::{self, state::AppState},
    config::Settings,
    domain::{Account, CreateAccountRequest, PasswordInput, Role},
    repository::{AccountRepository, SqliteAccountRepository},
    service::ServiceContext,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// Every connection to `sqlite::memory:` is its own database, so the pool is
/// pinned to a single connection that never gets recycled.
pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.auth.secret_key = "integration-test-secret".to_string();
    settings
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub pool: SqlitePool,
}

pub async fn test_app() -> anyhow::Result<TestApp> {
    test_app_with(test_settings()).await
}

pub async fn test_app_with(settings: Settings) -> anyhow::Result<TestApp> {
    let pool = test_pool().await?;
    let service_context = Arc::new(ServiceContext::new(pool.clone(), &settings));
    let state = AppState::new(service_context, Arc::new(settings));

    Ok(TestApp {
        app: api::create_app(state.clone()),
        state,
        pool,
    })
}

pub async fn create_account(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Account> {
    let repo = SqliteAccountRepository::new(pool.clone());
    let account = repo
        .create(CreateAccountRequest {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: PasswordInput::plain(password),
            role,
        })
        .await?;
    Ok(account)
}
