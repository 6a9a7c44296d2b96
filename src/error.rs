use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Clustering error: {0}")]
    Clustering(#[from] ClusteringError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Failures of a single clustering pass.
///
/// None of these ever reach the review submission that triggered the pass;
/// they are logged there and the previous cluster set stays in place.
#[derive(thiserror::Error, Debug)]
pub enum ClusteringError {
    /// Degenerate input: no users, mismatched labels, unusable k
    #[error("invalid clustering input: {0}")]
    Input(String),

    /// The partitioning routine produced unusable output or aborted
    #[error("clustering algorithm failed: {0}")]
    Algorithm(String),

    /// The store failed while the pass read its inputs or replaced the
    /// cluster set; a failed replacement is rolled back
    #[error("cluster store operation failed: {0}")]
    Store(#[source] Box<AppError>),
}

impl ClusteringError {
    pub fn store(err: AppError) -> Self {
        ClusteringError::Store(Box::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Clustering(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = AppError::NotFound("wine 7".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let response = AppError::Conflict("username taken".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_clustering_store_error_keeps_source() {
        let err = ClusteringError::store(AppError::NotFound("user ghost".to_string()));
        assert_eq!(
            err.to_string(),
            "cluster store operation failed: Not found: user ghost"
        );
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Not found: user ghost"));
    }

    #[test]
    fn test_migration_failure_is_internal() {
        let err = AppError::from(sqlx::migrate::MigrateError::VersionMissing(20240101000000));
        assert!(matches!(err, AppError::Migration(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
