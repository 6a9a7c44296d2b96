use std::sync::Arc;

use crate::{
    config::ClusteringMode,
    db::{MemoryStore, Store},
    services::{ClusteringService, KMeansConfig, ReviewService},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clustering: Arc<ClusteringService>,
    pub reviews: Arc<ReviewService>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl AppState {
    /// Wires the review and clustering services over one store
    pub fn new<S: Store + 'static>(store: Arc<S>, kmeans: KMeansConfig, mode: ClusteringMode) -> Self {
        let clustering = Arc::new(ClusteringService::new(store.clone(), kmeans));
        let reviews = Arc::new(ReviewService::new(store.clone(), clustering.clone(), mode));
        Self {
            store,
            clustering,
            reviews,
        }
    }

    /// Creates a new empty in-memory application state
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            KMeansConfig::default(),
            ClusteringMode::Inline,
        )
    }
}
