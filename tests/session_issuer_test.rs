mod common;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use beacon::{
    auth::{TokenIssuer, TokenType},
    domain::Role,
    error::AppError,
    repository::{AccountRepository, SqliteAccountRepository},
    service::session_issuer::SessionIssuer,
};

async fn setup() -> anyhow::Result<(SessionIssuer, Arc<TokenIssuer>, sqlx::SqlitePool)> {
    let pool = common::test_pool().await?;
    let settings = common::test_settings();
    let repo: Arc<dyn AccountRepository> = Arc::new(SqliteAccountRepository::new(pool.clone()));
    let tokens = Arc::new(TokenIssuer::new(&settings.auth));
    Ok((SessionIssuer::new(repo, tokens.clone()), tokens, pool))
}

#[tokio::test]
async fn test_login_by_username_or_email() -> anyhow::Result<()> {
    let (issuer, tokens, pool) = setup().await?;
    let alice = common::create_account(&pool, "alice", "s3cret-pass", Role::Regular).await?;

    let by_username = issuer.login("alice", "s3cret-pass").await?;
    assert_eq!(by_username.account.id, alice.id);

    let by_email = issuer.login("alice@example.com", "s3cret-pass").await?;
    assert_eq!(by_email.account.id, alice.id);

    let claims = tokens.verify(&by_email.tokens.access, TokenType::Access)?;
    assert_eq!(claims.account_id()?, alice.id);
    assert_eq!(claims.username, "alice");

    Ok(())
}

#[tokio::test]
async fn test_failures_are_indistinguishable() -> anyhow::Result<()> {
    let (issuer, _tokens, pool) = setup().await?;
    let alice = common::create_account(&pool, "alice", "s3cret-pass", Role::Regular).await?;

    let wrong_password = issuer.login("alice", "nope").await.unwrap_err();
    let unknown = issuer.login("mallory", "s3cret-pass").await.unwrap_err();
    assert!(matches!(wrong_password, AppError::InvalidCredentials));
    assert!(matches!(unknown, AppError::InvalidCredentials));

    sqlx::query("UPDATE accounts SET is_active = 0 WHERE id = ?")
        .bind(alice.id.to_string())
        .execute(&pool)
        .await?;
    let inactive = issuer.login("alice", "s3cret-pass").await.unwrap_err();
    assert!(matches!(inactive, AppError::InvalidCredentials));

    Ok(())
}

#[tokio::test]
async fn test_email_resolves_to_its_own_account() -> anyhow::Result<()> {
    let (issuer, _tokens, pool) = setup().await?;
    // A username that looks like somebody else's email does not shadow it
    common::create_account(&pool, "bob", "bob-password", Role::Regular).await?;
    common::create_account(&pool, "bob@example.com", "imposter-pw", Role::Regular).await?;

    let outcome = issuer.login("bob@example.com", "bob-password").await?;
    assert_eq!(outcome.account.username, "bob");

    Ok(())
}

#[tokio::test]
async fn test_must_change_password_and_last_login() -> anyhow::Result<()> {
    let (issuer, _tokens, pool) = setup().await?;
    let alice = common::create_account(&pool, "alice", "s3cret-pass", Role::Regular).await?;

    let outcome = issuer.login("alice", "s3cret-pass").await?;
    assert!(outcome.must_change_password);

    let repo = SqliteAccountRepository::new(pool.clone());
    assert!(repo.find_by_id(alice.id).await?.unwrap().last_login_at.is_some());

    sqlx::query("DELETE FROM profiles WHERE account_id = ?")
        .bind(alice.id.to_string())
        .execute(&pool)
        .await?;
    let outcome = issuer.login("alice", "s3cret-pass").await?;
    assert!(!outcome.must_change_password);

    Ok(())
}

#[tokio::test]
async fn test_refresh_issues_access_token() -> anyhow::Result<()> {
    let (issuer, tokens, pool) = setup().await?;
    let alice = common::create_account(&pool, "alice", "s3cret-pass", Role::Admin).await?;

    let outcome = issuer.login("alice", "s3cret-pass").await?;
    let access = issuer.refresh(&outcome.tokens.refresh).await?;
    let claims = tokens.verify(&access, TokenType::Access)?;
    assert_eq!(claims.account_id()?, alice.id);
    assert_eq!(claims.role, Role::Admin);

    // an access token cannot be used to refresh
    let err = issuer.refresh(&outcome.tokens.access).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));

    Ok(())
}

#[tokio::test]
async fn test_unknown_identifier_costs_a_password_check() -> anyhow::Result<()> {
    let (issuer, _tokens, pool) = setup().await?;
    common::create_account(&pool, "alice", "s3cret-pass", Role::Regular).await?;

    // first failure hashes the placeholder password
    let _ = issuer.login("nobody", "x").await;

    let mut unknown = Duration::ZERO;
    let mut wrong_password = Duration::ZERO;
    for _ in 0..3 {
        let started = Instant::now();
        assert!(issuer.login("nobody", "x").await.is_err());
        unknown += started.elapsed();

        let started = Instant::now();
        assert!(issuer.login("alice", "x").await.is_err());
        wrong_password += started.elapsed();
    }

    // Same order of magnitude: both paths run one argon2 verification
    assert!(
        unknown * 4 >= wrong_password,
        "unknown user {:?} vs wrong password {:?}",
        unknown,
        wrong_password
    );

    Ok(())
}
