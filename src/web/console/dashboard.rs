use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension,
};
use axum_extra::extract::CookieJar;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    logging,
    web::{
        flash::{self, Flash},
        templates::{AccountRow, HtmlTemplate, UserInfo},
    },
};

use super::server_error;

const RECENT_ACCOUNTS: i64 = 5;

#[derive(Template)]
#[template(path = "console/dashboard.html")]
pub struct DashboardTemplate {
    pub current_user: Option<UserInfo>,
    pub flash: Option<Flash>,
    pub total_users: i64,
    pub admin_users: i64,
    pub regular_users: i64,
    pub recent_users: Vec<AccountRow>,
    pub last_error: Option<String>,
}

// GET /dashboard/
pub async fn dashboard_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    jar: CookieJar,
) -> Response {
    let user_info = UserInfo::from(&current_user.account);

    let stats = match state.service_context.account_service
        .dashboard_stats(RECENT_ACCOUNTS)
        .await
    {
        Ok(stats) => stats,
        Err(e) => {
            tracing::error!("Failed to load dashboard stats: {}", e);
            return server_error(Some(user_info));
        }
    };

    let last_error = logging::last_error_line(&state.settings.logging.error_log_path).await;
    let (jar, flash) = flash::take(jar);

    let viewer = current_user.account.role;
    let recent_users = stats.recent
        .iter()
        .map(|account| AccountRow::new(account, viewer))
        .collect();

    (jar, HtmlTemplate(DashboardTemplate {
        current_user: Some(user_info),
        flash,
        total_users: stats.counts.total,
        admin_users: stats.counts.staff,
        regular_users: stats.counts.regular,
        recent_users,
        last_error,
    })).into_response()
}
