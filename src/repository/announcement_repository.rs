use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{Announcement, NewAnnouncement},
    error::{AppError, Result},
    repository::AnnouncementRepository,
};

#[derive(FromRow)]
struct AnnouncementRow {
    id: String,
    title: Option<String>,
    message: String,
    link: Option<String>,
    active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteAnnouncementRepository {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_announcement(row: AnnouncementRow) -> Result<Announcement> {
        Ok(Announcement {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title.filter(|t| !t.is_empty()),
            message: row.message,
            link: row.link.filter(|l| !l.is_empty()),
            active: row.active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepository {
    async fn create(&self, announcement: NewAnnouncement) -> Result<Announcement> {
        if announcement.message.trim().is_empty() {
            return Err(AppError::Validation("message: This field may not be blank.".to_string()));
        }

        let id = Uuid::new_v4();
        let now_naive = Utc::now().naive_utc();
        let active_int = if announcement.active { 1i32 } else { 0i32 };

        sqlx::query(
            r#"
            INSERT INTO announcements (id, title, message, link, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(&announcement.title)
        .bind(&announcement.message)
        .bind(&announcement.link)
        .bind(active_int)
        .bind(now_naive)
        .bind(now_naive)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created announcement".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>> {
        let row = sqlx::query_as::<_, AnnouncementRow>(
            r#"
            SELECT id, title, message, link, active, created_at, updated_at
            FROM announcements
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_announcement).transpose()
    }

    async fn list(&self) -> Result<Vec<Announcement>> {
        let rows = sqlx::query_as::<_, AnnouncementRow>(
            r#"
            SELECT id, title, message, link, active, created_at, updated_at
            FROM announcements
            ORDER BY created_at DESC, rowid DESC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_announcement)
            .collect()
    }

    async fn latest_active(&self) -> Result<Option<Announcement>> {
        let row = sqlx::query_as::<_, AnnouncementRow>(
            r#"
            SELECT id, title, message, link, active, created_at, updated_at
            FROM announcements
            WHERE active = 1
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_announcement).transpose()
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Announcement> {
        let result = sqlx::query(
            "UPDATE announcements SET active = ?, updated_at = ? WHERE id = ?"
        )
        .bind(if active { 1i32 } else { 0i32 })
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Announcement not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated announcement".to_string())
        })
    }
}
