use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Users
        .route("/users", post(handlers::create_user))
        // Wines
        .route("/wines", get(handlers::list_wines).post(handlers::create_wine))
        .route("/wines/:id", get(handlers::get_wine))
        // Reviews
        .route("/reviews", get(handlers::list_reviews).post(handlers::create_review))
        .route("/reviews/:id", get(handlers::get_review))
        // Clusters
        .route("/clusters", get(handlers::list_clusters))
        .route("/clusters/rebuild", post(handlers::rebuild_clusters))
        .with_state(state)
}
