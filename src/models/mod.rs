pub mod cluster;
pub mod review;
pub mod user;
pub mod wine;

pub use cluster::{ClusterAssignment, StoredCluster};
pub use review::{NewReview, Review, LATEST_REVIEWS_LIMIT};
pub use user::{NewUser, User, MAX_USERNAME_LEN};
pub use wine::{NewWine, Wine, WineDetail, WineSummary, MAX_WINE_NAME_LEN};
