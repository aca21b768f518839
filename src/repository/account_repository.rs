use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    auth,
    domain::{Account, AccountCounts, CreateAccountRequest, Profile, Role},
    error::{AppError, Result},
    repository::AccountRepository,
};

// Database row struct that matches SQLite schema
#[derive(FromRow)]
struct AccountRow {
    id: String,
    username: String,
    email: String,
    role: String,
    is_active: i32,
    last_login_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct ProfileRow {
    account_id: String,
    must_change_password: i32,
}

const ACCOUNT_COLUMNS: &str =
    "id, username, email, role, is_active, last_login_at, created_at, updated_at";

pub struct SqliteAccountRepository {
    pool: SqlitePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_account(row: AccountRow) -> Result<Account> {
        Ok(Account {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            username: row.username,
            email: row.email,
            role: Self::parse_role(&row.role)?,
            is_active: row.is_active != 0,
            last_login_at: row.last_login_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_role(s: &str) -> Result<Role> {
        match s {
            "Regular" => Ok(Role::Regular),
            "Admin" => Ok(Role::Admin),
            "SuperAdmin" => Ok(Role::SuperAdmin),
            _ => Err(AppError::Database(format!("Invalid role: {}", s))),
        }
    }

    fn role_to_str(role: Role) -> &'static str {
        match role {
            Role::Regular => "Regular",
            Role::Admin => "Admin",
            Role::SuperAdmin => "SuperAdmin",
        }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Account>> {
        let sql = format!("SELECT {} FROM accounts WHERE {} = ?", ACCOUNT_COLUMNS, column);
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_account).transpose()
    }
}

fn map_insert_error(err: sqlx::Error) -> AppError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("Username or email already exists".to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn create(&self, request: CreateAccountRequest) -> Result<Account> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let now_naive = Utc::now().naive_utc();

        // Provisioning: stored password is always a hash, account starts
        // active, and the profile is written in the same transaction.
        let password_hash = auth::password_hash_for(&request.password).await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, username, email, password_hash, role, is_active,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(&request.username)
        .bind(&request.email)
        .bind(&password_hash)
        .bind(Self::role_to_str(request.role))
        .bind(now_naive)
        .bind(now_naive)
        .execute(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        sqlx::query("INSERT INTO profiles (account_id, must_change_password) VALUES (?, 1)")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Created account {} ({:?})", request.username, request.role);

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created account".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        self.find_one("id", &id.to_string()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.find_one("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.find_one("username", username).await
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM accounts WHERE username = ?"
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM accounts WHERE email = ?"
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn password_hash(&self, id: Uuid) -> Result<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM accounts WHERE id = ?"
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(hash)
    }

    async fn profile(&self, id: Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT account_id, must_change_password FROM profiles WHERE account_id = ?"
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Profile {
                account_id: Uuid::parse_str(&r.account_id)
                    .map_err(|e| AppError::Database(e.to_string()))?,
                must_change_password: r.must_change_password != 0,
            })),
            None => Ok(None),
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Account>> {
        let sql = format!(
            "SELECT {} FROM accounts ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            ACCOUNT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(Self::row_to_account)
            .collect()
    }

    async fn list_all(&self) -> Result<Vec<Account>> {
        let sql = format!(
            "SELECT {} FROM accounts ORDER BY created_at DESC, rowid DESC",
            ACCOUNT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(Self::row_to_account)
            .collect()
    }

    async fn counts(&self) -> Result<AccountCounts> {
        let (total, staff): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN role IN ('Admin', 'SuperAdmin') THEN 1 ELSE 0 END), 0)
            FROM accounts
            "#
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AccountCounts {
            total,
            staff,
            regular: total - staff,
        })
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let id_str = id.to_string();
        let now_naive = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE accounts SET password_hash = ?, updated_at = ? WHERE id = ?"
        )
        .bind(password_hash)
        .bind(now_naive)
        .bind(&id_str)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Account not found".to_string()));
        }

        sqlx::query("UPDATE profiles SET must_change_password = 0 WHERE account_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn record_login(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE accounts SET last_login_at = ? WHERE id = ?")
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM profiles WHERE account_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM sessions WHERE account_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Account not found".to_string()));
        }

        tx.commit().await?;

        Ok(())
    }
}
