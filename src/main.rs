use std::sync::Arc;

use beacon::{
    api::{self, state::AppState},
    config::Settings,
    db,
    logging,
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let (settings, config_error) = match Settings::new() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    // Initialize tracing
    logging::init(&settings.logging)?;

    if let Some(e) = config_error {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
    }

    if settings.uses_insecure_secret() {
        tracing::warn!("auth.secret_key is the built-in default; set SECRET_KEY before deploying");
    }

    tracing::info!("Starting Beacon server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let (db_pool, _source) = db::connect(&settings.database).await?;

    // Run migrations
    db::migrate(&db_pool).await?;

    // Create service context
    let service_context = Arc::new(ServiceContext::new(db_pool, &settings));

    match service_context.auth_service.cleanup_expired_sessions().await {
        Ok(0) => {}
        Ok(removed) => tracing::info!("Removed {} expired console sessions", removed),
        Err(e) => tracing::warn!("Session cleanup failed: {}", e),
    }

    let settings = Arc::new(settings);
    let app = api::create_app(AppState::new(service_context, settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
