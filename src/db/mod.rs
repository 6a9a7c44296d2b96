//! Storage seams.
//!
//! The clustering core only sees [`RatingSource`] and [`ClusterRepository`];
//! the HTTP layer additionally needs [`CatalogRepository`]. Both
//! [`PgStore`] and [`MemoryStore`] implement all three.

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{ClusterAssignment, NewReview, Review, StoredCluster, User, Wine, WineDetail, WineSummary},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};

/// Read access to everything a clustering pass consumes
#[async_trait]
pub trait RatingSource: Send + Sync {
    /// All users, ordered by id
    async fn list_all_users(&self) -> AppResult<Vec<User>>;

    /// All reviews, unfiltered
    async fn list_all_reviews(&self) -> AppResult<Vec<Review>>;

    async fn count_reviews(&self) -> AppResult<u64>;
}

/// Persisted cluster state
#[async_trait]
pub trait ClusterRepository: Send + Sync {
    /// Replaces every persisted cluster and membership edge with `clusters`.
    ///
    /// Runs as one unit: clusters are created first, then members are linked.
    /// On any failure the previous cluster set is left exactly as it was.
    async fn replace_clusters(&self, clusters: &[ClusterAssignment]) -> AppResult<()>;

    async fn list_clusters(&self) -> AppResult<Vec<StoredCluster>>;
}

/// Users, wines and reviews as served over HTTP
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Fails with `Conflict` when the username is taken
    async fn create_user(&self, username: &str) -> AppResult<User>;

    async fn create_wine(&self, name: &str) -> AppResult<Wine>;

    /// Fails with `NotFound` when the wine does not exist
    async fn insert_review(&self, review: &NewReview) -> AppResult<Review>;

    async fn get_review(&self, id: i64) -> AppResult<Option<Review>>;

    /// Most recent reviews first
    async fn latest_reviews(&self, limit: usize) -> AppResult<Vec<Review>>;

    /// Wine summaries ordered by name, descending
    async fn list_wines(&self) -> AppResult<Vec<WineSummary>>;

    async fn get_wine(&self, id: i64) -> AppResult<Option<WineDetail>>;
}

/// What a clustering pass needs from storage
pub trait ClusterBackend: RatingSource + ClusterRepository {}

impl<T: RatingSource + ClusterRepository + ?Sized> ClusterBackend for T {}

/// Everything the application needs from storage
pub trait Store: ClusterBackend + CatalogRepository {}

impl<T: ClusterBackend + CatalogRepository + ?Sized> Store for T {}
