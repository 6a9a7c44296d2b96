use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    db::{CatalogRepository, ClusterRepository},
    error::{AppError, AppResult},
    models::{
        NewReview, NewUser, NewWine, Review, StoredCluster, User, Wine, WineDetail, WineSummary,
        LATEST_REVIEWS_LIMIT, MAX_WINE_NAME_LEN,
    },
    services::PassOutcome,
};

use super::AppState;

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Register a reviewer
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let username = request.normalized_username()?;

    let user = state.store.create_user(&username).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Add a wine to the catalog
pub async fn create_wine(
    State(state): State<AppState>,
    Json(request): Json<NewWine>,
) -> AppResult<(StatusCode, Json<Wine>)> {
    let name = request.name.trim();
    if name.is_empty() || name.chars().count() > MAX_WINE_NAME_LEN {
        return Err(AppError::InvalidInput(format!(
            "wine name must be 1 to {} characters",
            MAX_WINE_NAME_LEN
        )));
    }

    let wine = state.store.create_wine(name).await?;
    Ok((StatusCode::CREATED, Json(wine)))
}

/// Get all wines with their average rating
pub async fn list_wines(State(state): State<AppState>) -> AppResult<Json<Vec<WineSummary>>> {
    Ok(Json(state.store.list_wines().await?))
}

/// Get one wine and its reviews
pub async fn get_wine(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<WineDetail>> {
    state
        .store
        .get_wine(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("wine {}", id)))
}

/// Record a review; may run a clustering pass before answering
pub async fn create_review(
    State(state): State<AppState>,
    Json(request): Json<NewReview>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let review = state.reviews.submit(request).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Get the latest reviews
pub async fn list_reviews(State(state): State<AppState>) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(state.store.latest_reviews(LATEST_REVIEWS_LIMIT).await?))
}

pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Review>> {
    state
        .store
        .get_review(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("review {}", id)))
}

/// Get the current clusters with their members
pub async fn list_clusters(State(state): State<AppState>) -> AppResult<Json<Vec<StoredCluster>>> {
    Ok(Json(state.store.list_clusters().await?))
}

/// Run a clustering pass now, whatever the review count
pub async fn rebuild_clusters(State(state): State<AppState>) -> AppResult<Json<PassOutcome>> {
    let outcome = state.clustering.rebuild().await?;
    Ok(Json(outcome))
}
