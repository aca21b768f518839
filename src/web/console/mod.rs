pub mod dashboard;
pub mod users;

use axum::{
    http::StatusCode,
    middleware,
    response::Response,
    routing::get,
    Router,
};

use crate::{
    api::{middleware::auth::SessionInfo, state::AppState},
    web::templates::{message_page, UserInfo},
};

pub fn create_console_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard/", get(dashboard::dashboard_page))
        .route("/users/", get(users::users_page))
        .route("/users/add/", get(users::add_user_page).post(users::add_user))
        .route("/add-admin/", get(users::add_admin_page).post(users::add_admin))
        .route(
            "/users/delete/:id/",
            get(users::delete_user_page).post(users::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::api::middleware::auth::require_console_access,
        ))
}

/// Rotates the session's CSRF token for a freshly rendered form.
pub(crate) async fn issue_csrf(state: &AppState, session: &SessionInfo) -> String {
    match state.service_context.csrf_service.issue(&session.session_id).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Failed to issue CSRF token: {}", e);
            String::new()
        }
    }
}

pub(crate) async fn csrf_valid(state: &AppState, session: &SessionInfo, token: &str) -> bool {
    state.service_context.csrf_service
        .verify(&session.session_id, token)
        .await
        .unwrap_or(false)
}

pub(crate) fn csrf_failure(current_user: Option<UserInfo>) -> Response {
    message_page(
        StatusCode::FORBIDDEN,
        current_user,
        "Forbidden",
        "CSRF verification failed. Request aborted.",
        "/dashboard/",
    )
}

pub(crate) fn not_found(current_user: Option<UserInfo>) -> Response {
    message_page(
        StatusCode::NOT_FOUND,
        current_user,
        "Not Found",
        "User not found",
        "/users/",
    )
}

pub(crate) fn server_error(current_user: Option<UserInfo>) -> Response {
    message_page(
        StatusCode::INTERNAL_SERVER_ERROR,
        current_user,
        "Server Error",
        "Something went wrong. The error has been logged.",
        "/dashboard/",
    )
}
