pub mod clustering;
pub mod kmeans;
pub mod rating_matrix;
pub mod reviews;
pub mod synchronizer;
pub mod trigger;

pub use clustering::{ClusteringService, PassOutcome, PassSummary};
pub use kmeans::{ClusterEngine, KMeansConfig, Partition};
pub use rating_matrix::RatingMatrix;
pub use reviews::ReviewService;
pub use synchronizer::ClusterSynchronizer;
pub use trigger::UpdateTrigger;
