use sqlx::SqlitePool;

use crate::error::Result;
use super::{generate_token, hash_token};

/// One CSRF token per console session, rotated every time a form is rendered.
pub struct CsrfService {
    pool: SqlitePool,
}

impl CsrfService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn issue(&self, session_id: &str) -> Result<String> {
        let token = generate_token();

        sqlx::query(
            r#"
            INSERT INTO csrf_tokens (session_id, token_hash, created_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(session_id) DO UPDATE SET
                token_hash = excluded.token_hash,
                created_at = CURRENT_TIMESTAMP
            "#
        )
        .bind(session_id)
        .bind(hash_token(&token))
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    pub async fn verify(&self, session_id: &str, token: &str) -> Result<bool> {
        if token.is_empty() {
            return Ok(false);
        }

        let matches = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM csrf_tokens WHERE session_id = ? AND token_hash = ?"
        )
        .bind(session_id)
        .bind(hash_token(token))
        .fetch_one(&self.pool)
        .await?;

        Ok(matches > 0)
    }

    /// Called on logout.
    pub async fn revoke(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM csrf_tokens WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
