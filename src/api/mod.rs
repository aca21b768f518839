pub mod handlers;
pub mod middleware;
pub mod state;

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};

use state::AppState;

/// Full application: JSON API, admin console and static assets.
pub fn create_app(app_state: AppState) -> Router {
    let cors = if app_state.settings.cors.allow_any_origin {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        // Root and health endpoints
        .route("/health", get(handlers::root::health_check))
        .route("/api", get(handlers::root::api_info))

        // API routes
        .nest("/api", api_routes(app_state.clone()))

        // Admin console
        .merge(crate::web::create_web_routes(app_state.clone()))

        // Add state to the router
        .with_state(app_state.clone())

        // Middleware
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(axum::middleware::from_fn_with_state(
            app_state,
            middleware::hosts::enforce_allowed_hosts,
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/login/", post(handlers::auth::login))
        .route("/token/refresh/", post(handlers::auth::refresh))
        .route("/announcements/active/", get(handlers::announcements::active))
        .nest("/users", user_routes(state))
}

fn user_routes(state: AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/create/", post(handlers::users::create))
        .route("/list/", get(handlers::users::list))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_staff,
        ));

    let authenticated = Router::new()
        .route("/me/", get(handlers::users::me))
        .route("/change-password/", post(handlers::users::change_password))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ));

    staff.merge(authenticated)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}
