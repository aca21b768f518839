use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct ApiInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

// GET /health
// 503 when the database stops answering.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database_ok = sqlx::query("SELECT 1")
        .execute(&state.service_context.db_pool)
        .await
        .is_ok();

    let status = if database_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (status, Json(json!({
        "status": if database_ok { "healthy" } else { "degraded" },
        "database": if database_ok { "ok" } else { "unavailable" },
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

// GET /api
pub async fn api_info() -> Json<ApiInfo> {
    Json(ApiInfo {
        name: "Beacon API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            "/api/login/",
            "/api/token/refresh/",
            "/api/users/me/",
            "/api/users/change-password/",
            "/api/users/create/",
            "/api/users/list/",
            "/api/announcements/active/",
        ],
    })
}
