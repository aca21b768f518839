use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::Announcement,
    error::Result,
};

#[derive(Debug, Serialize)]
pub struct AnnouncementDto {
    pub id: Uuid,
    pub title: Option<String>,
    pub message: String,
    pub link: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Announcement> for AnnouncementDto {
    fn from(announcement: Announcement) -> Self {
        Self {
            id: announcement.id,
            title: announcement.title,
            message: announcement.message,
            link: announcement.link,
            active: announcement.active,
            created_at: announcement.created_at,
        }
    }
}

// GET /api/announcements/active/
// Always 200; `{"message": null}` when nothing is active.
pub async fn active(State(state): State<AppState>) -> Result<Json<Value>> {
    let latest = state.service_context.announcement_repo
        .latest_active()
        .await?;

    let body = match latest {
        Some(announcement) => serde_json::to_value(AnnouncementDto::from(announcement))
            .map_err(|e| crate::error::AppError::Internal(e.to_string()))?,
        None => json!({ "message": null }),
    };

    Ok(Json(body))
}
