//! Clustering passes: build the rating matrix, partition users, replace the
//! stored clusters.
//!
//! Passes are serialized by a single lock held from the trigger check to the
//! final commit, so two review submissions landing on the same trigger
//! boundary can never interleave their cluster replacements. The trigger is
//! evaluated against the count each submission observed, not the count at
//! the time its pass gets to run.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    db::{ClusterBackend, RatingSource},
    error::ClusteringError,
    services::{
        kmeans::{ClusterEngine, KMeansConfig},
        rating_matrix::RatingMatrix,
        synchronizer::ClusterSynchronizer,
        trigger::UpdateTrigger,
    },
};

/// What a pass ended up doing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassOutcome {
    /// The review count is not on a trigger boundary
    NotTriggered { review_count: u64 },
    /// There was nothing to cluster; stored clusters are unchanged
    Skipped { reason: String },
    Completed(PassSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassSummary {
    pub pass_id: Uuid,
    pub users: usize,
    pub wine_columns: usize,
    pub ratings: usize,
    pub clusters: usize,
    pub inertia: f64,
    pub duration_ms: u64,
}

pub struct ClusteringService {
    backend: Arc<dyn ClusterBackend>,
    engine: Arc<ClusterEngine>,
    pass_lock: Mutex<()>,
}

impl ClusteringService {
    pub fn new(backend: Arc<dyn ClusterBackend>, config: KMeansConfig) -> Self {
        Self {
            backend,
            engine: Arc::new(ClusterEngine::new(config)),
            pass_lock: Mutex::new(()),
        }
    }

    /// Runs a pass if `review_count`, the count observed right after a review
    /// was stored, is on a trigger boundary
    pub async fn on_review_recorded(&self, review_count: u64) -> Result<PassOutcome, ClusteringError> {
        let _guard = self.pass_lock.lock().await;

        if !UpdateTrigger::should_fire(review_count) {
            tracing::debug!(
                review_count,
                step = UpdateTrigger::step(review_count),
                "Clustering not triggered"
            );
            return Ok(PassOutcome::NotTriggered { review_count });
        }

        self.run_pass_locked().await
    }

    /// Runs a pass regardless of the trigger
    pub async fn rebuild(&self) -> Result<PassOutcome, ClusteringError> {
        let _guard = self.pass_lock.lock().await;
        self.run_pass_locked().await
    }

    /// Callers must hold `pass_lock`
    async fn run_pass_locked(&self) -> Result<PassOutcome, ClusteringError> {
        let pass_id = Uuid::new_v4();
        let start = Instant::now();

        let users = self
            .backend
            .list_all_users()
            .await
            .map_err(ClusteringError::store)?;
        if users.is_empty() {
            tracing::info!(pass_id = %pass_id, "No users to cluster, keeping current clusters");
            return Ok(PassOutcome::Skipped {
                reason: "no users".to_string(),
            });
        }

        let reviews = self
            .backend
            .list_all_reviews()
            .await
            .map_err(ClusteringError::store)?;

        let matrix = RatingMatrix::build(&users, &reviews);
        tracing::debug!(
            pass_id = %pass_id,
            users = matrix.num_rows(),
            wine_columns = matrix.num_columns(),
            ratings = matrix.nnz(),
            "Rating matrix built"
        );

        // K-means is CPU bound; keep it off the async workers
        let engine = Arc::clone(&self.engine);
        let (matrix, partition) = tokio::task::spawn_blocking(move || {
            let partition = engine.partition(&matrix);
            (matrix, partition)
        })
        .await
        .map_err(|e| ClusteringError::Algorithm(format!("clustering task aborted: {}", e)))?;
        let partition = partition?;

        let clusters = ClusterSynchronizer::assemble(matrix.usernames(), &partition)?;
        ClusterSynchronizer::commit(self.backend.as_ref(), &clusters).await?;

        let summary = PassSummary {
            pass_id,
            users: matrix.num_rows(),
            wine_columns: matrix.num_columns(),
            ratings: matrix.nnz(),
            clusters: clusters.len(),
            inertia: partition.inertia,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            pass_id = %pass_id,
            users = summary.users,
            clusters = summary.clusters,
            inertia = summary.inertia,
            duration_ms = summary.duration_ms,
            "Clustering pass completed"
        );

        Ok(PassOutcome::Completed(summary))
    }
}
