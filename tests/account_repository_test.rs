mod common;

use beacon::{
    auth::AuthService,
    domain::{CreateAccountRequest, PasswordInput, Role},
    error::AppError,
    repository::{AccountRepository, SqliteAccountRepository},
};

fn request(username: &str, email: &str) -> CreateAccountRequest {
    CreateAccountRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: PasswordInput::plain("a-long-password"),
        role: Role::Regular,
    }
}

#[tokio::test]
async fn test_create_provisions_profile() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = SqliteAccountRepository::new(pool.clone());

    let account = repo.create(request("alice", "alice@x.com")).await?;
    assert_eq!(account.username, "alice");
    assert_eq!(account.role, Role::Regular);
    assert!(account.is_active);
    assert!(account.last_login_at.is_none());

    let profile = repo.profile(account.id).await?.expect("profile created with account");
    assert_eq!(profile.account_id, account.id);
    assert!(profile.must_change_password);

    Ok(())
}

#[tokio::test]
async fn test_password_is_hashed_once() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = SqliteAccountRepository::new(pool.clone());

    let plain = repo.create(request("plain", "plain@x.com")).await?;
    let stored = repo.password_hash(plain.id).await?.unwrap();
    assert_ne!(stored, "a-long-password");
    assert!(AuthService::verify_password("a-long-password", &stored).await?);

    let prehashed = AuthService::hash_password("another-password").await?;
    let mut req = request("hashed", "hashed@x.com");
    req.password = PasswordInput::Hashed(prehashed.clone());
    let account = repo.create(req).await?;
    assert_eq!(repo.password_hash(account.id).await?.unwrap(), prehashed);

    Ok(())
}

#[tokio::test]
async fn test_duplicates_rejected_without_partial_rows() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = SqliteAccountRepository::new(pool.clone());

    repo.create(request("alice", "alice@x.com")).await?;

    let err = repo.create(request("alice", "other@x.com")).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = repo.create(request("bob", "alice@x.com")).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
        .fetch_one(&pool)
        .await?;
    assert_eq!(profiles, 1);
    assert_eq!(repo.counts().await?.total, 1);

    Ok(())
}

#[tokio::test]
async fn test_counts_and_ordering() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = SqliteAccountRepository::new(pool.clone());

    for (name, role) in [("u1", Role::Regular), ("a1", Role::Admin), ("s1", Role::SuperAdmin), ("u2", Role::Regular)] {
        let mut req = request(name, &format!("{}@x.com", name));
        req.role = role;
        repo.create(req).await?;
    }

    let counts = repo.counts().await?;
    assert_eq!(counts.total, 4);
    assert_eq!(counts.staff, 2);
    assert_eq!(counts.regular, 2);

    let newest_first: Vec<String> = repo.list(10, 0).await?
        .into_iter()
        .map(|a| a.username)
        .collect();
    assert_eq!(newest_first, vec!["u2", "s1", "a1", "u1"]);

    let second_page = repo.list(2, 2).await?;
    assert_eq!(second_page.len(), 2);
    assert_eq!(second_page[0].username, "a1");

    Ok(())
}

#[tokio::test]
async fn test_set_password_clears_flag() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = SqliteAccountRepository::new(pool.clone());

    let account = repo.create(request("alice", "alice@x.com")).await?;
    let new_hash = AuthService::hash_password("fresh-password-1").await?;
    repo.set_password(account.id, &new_hash).await?;

    assert!(!repo.profile(account.id).await?.unwrap().must_change_password);
    assert_eq!(repo.password_hash(account.id).await?.unwrap(), new_hash);

    Ok(())
}

#[tokio::test]
async fn test_delete_cascades() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = SqliteAccountRepository::new(pool.clone());
    let auth = AuthService::new(pool.clone(), 1, false);

    let account = repo.create(request("alice", "alice@x.com")).await?;
    let (_session, token) = auth.create_session(account.id).await?;

    repo.delete(account.id).await?;

    assert!(repo.find_by_id(account.id).await?.is_none());
    assert!(repo.profile(account.id).await?.is_none());
    assert!(auth.validate_session(&token).await?.is_none());

    let err = repo.delete(account.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_record_login() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = SqliteAccountRepository::new(pool.clone());

    let account = repo.create(request("alice", "alice@x.com")).await?;
    repo.record_login(account.id).await?;

    let reloaded = repo.find_by_id(account.id).await?.unwrap();
    assert!(reloaded.last_login_at.is_some());

    Ok(())
}
