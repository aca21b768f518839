pub mod console;
pub mod flash;
pub mod templates;

use axum::{
    Router,
    routing::get,
};
use tower_http::services::ServeDir;

use crate::api::state::AppState;

pub fn create_web_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Console login (web interface)
        .route("/", get(templates::auth::login_page).post(templates::auth::login_handler))
        .route("/logout/", get(templates::auth::logout_handler).post(templates::auth::logout_handler))

        // Console pages, behind the console guard
        .merge(console::create_console_routes(state))

        .nest_service("/static", ServeDir::new("static"))
}
