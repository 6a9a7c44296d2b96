use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use winerama::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, MemoryStore, PgStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("winerama={},tower_http=info", config.log_level)));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Initialize application state
    let state = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = create_pool(database_url, config.database_max_connections).await?;
            tracing::info!("Connected to PostgreSQL");
            AppState::new(Arc::new(PgStore::new(pool)), config.kmeans(), config.clustering_mode)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            AppState::new(Arc::new(MemoryStore::new()), config.kmeans(), config.clustering_mode)
        }
    };

    // Create the router with all routes
    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    // Start the server
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        address = %address,
        clustering_mode = ?config.clustering_mode,
        "Server running"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
