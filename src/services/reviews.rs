use std::sync::Arc;

use crate::{
    config::ClusteringMode,
    db::{CatalogRepository, RatingSource, Store},
    error::{AppResult, ClusteringError},
    models::{NewReview, Review},
    services::clustering::{ClusteringService, PassOutcome},
};

/// Records reviews and keeps the user clusters fresh behind them
pub struct ReviewService {
    store: Arc<dyn Store>,
    clustering: Arc<ClusteringService>,
    mode: ClusteringMode,
}

impl ReviewService {
    pub fn new(
        store: Arc<dyn Store>,
        clustering: Arc<ClusteringService>,
        mode: ClusteringMode,
    ) -> Self {
        Self {
            store,
            clustering,
            mode,
        }
    }

    /// Stores the review, then gives the clustering pass a chance to run.
    ///
    /// The review is committed before clustering starts and the result only
    /// depends on that write: clustering failures are logged and dropped.
    pub async fn submit(&self, review: NewReview) -> AppResult<Review> {
        review.validate()?;
        let stored = self.store.insert_review(&review).await?;

        tracing::info!(
            review_id = stored.id,
            wine_id = stored.wine_id,
            user_name = %stored.user_name,
            rating = stored.rating,
            "Review recorded"
        );

        // The trigger must see the count this submission produced, whenever
        // its pass gets to run
        let review_count = match self.store.count_reviews().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(review_id = stored.id, error = %e, "Could not count reviews, skipping clustering");
                return Ok(stored);
            }
        };

        match self.mode {
            ClusteringMode::Inline => {
                log_pass(stored.id, self.clustering.on_review_recorded(review_count).await);
            }
            ClusteringMode::Background => {
                let clustering = Arc::clone(&self.clustering);
                let review_id = stored.id;
                tokio::spawn(async move {
                    log_pass(review_id, clustering.on_review_recorded(review_count).await);
                });
            }
        }

        Ok(stored)
    }
}

fn log_pass(review_id: i64, result: Result<PassOutcome, ClusteringError>) {
    match result {
        Ok(PassOutcome::Completed(summary)) => {
            tracing::debug!(review_id, pass_id = %summary.pass_id, "Review triggered a clustering pass");
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(review_id, error = %e, "Clustering pass failed, previous clusters kept");
        }
    }
}
