use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{CatalogRepository, ClusterRepository, RatingSource};
use crate::{
    error::{AppError, AppResult},
    models::{ClusterAssignment, NewReview, Review, StoredCluster, User, Wine, WineDetail, WineSummary},
};

/// In-process store used when no database is configured, and by tests
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    wines: BTreeMap<i64, Wine>,
    reviews: BTreeMap<i64, Review>,
    clusters: ClusterTables,
    last_user_id: i64,
    last_wine_id: i64,
    last_review_id: i64,
    last_cluster_id: i64,
}

#[derive(Default)]
struct ClusterTables {
    names: BTreeMap<i64, String>,
    /// (cluster id, user id)
    members: BTreeSet<(i64, i64)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn user_id(&self, username: &str) -> Option<i64> {
        self.users
            .values()
            .find(|user| user.username == username)
            .map(|user| user.id)
    }
}

#[async_trait]
impl RatingSource for MemoryStore {
    async fn list_all_users(&self) -> AppResult<Vec<User>> {
        let tables = self.inner.read().await;
        Ok(tables.users.values().cloned().collect())
    }

    async fn list_all_reviews(&self) -> AppResult<Vec<Review>> {
        let tables = self.inner.read().await;
        Ok(tables.reviews.values().cloned().collect())
    }

    async fn count_reviews(&self) -> AppResult<u64> {
        let tables = self.inner.read().await;
        Ok(tables.reviews.len() as u64)
    }
}

#[async_trait]
impl ClusterRepository for MemoryStore {
    async fn replace_clusters(&self, clusters: &[ClusterAssignment]) -> AppResult<()> {
        let mut tables = self.inner.write().await;

        // Build the replacement on the side; the live tables are only touched
        // once both phases have succeeded.
        let mut staged = ClusterTables::default();
        let mut last_id = tables.last_cluster_id;
        let mut ids = Vec::with_capacity(clusters.len());

        for cluster in clusters {
            last_id += 1;
            staged.names.insert(last_id, cluster.name.clone());
            ids.push(last_id);
        }

        for (cluster, cluster_id) in clusters.iter().zip(ids) {
            for username in &cluster.members {
                let user_id = tables
                    .user_id(username)
                    .ok_or_else(|| AppError::NotFound(format!("user {}", username)))?;
                staged.members.insert((cluster_id, user_id));
            }
        }

        tables.clusters = staged;
        tables.last_cluster_id = last_id;
        Ok(())
    }

    async fn list_clusters(&self) -> AppResult<Vec<StoredCluster>> {
        let tables = self.inner.read().await;

        let clusters = tables
            .clusters
            .names
            .iter()
            .map(|(&id, name)| {
                let mut members: Vec<String> = tables
                    .clusters
                    .members
                    .range((id, i64::MIN)..=(id, i64::MAX))
                    .filter_map(|(_, user_id)| tables.users.get(user_id))
                    .map(|user| user.username.clone())
                    .collect();
                members.sort();
                StoredCluster {
                    id,
                    name: name.clone(),
                    members,
                }
            })
            .collect();

        Ok(clusters)
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn create_user(&self, username: &str) -> AppResult<User> {
        let mut tables = self.inner.write().await;
        if tables.user_id(username).is_some() {
            return Err(AppError::Conflict(format!("username {} is taken", username)));
        }

        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            username: username.to_string(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn create_wine(&self, name: &str) -> AppResult<Wine> {
        let mut tables = self.inner.write().await;
        tables.last_wine_id += 1;
        let wine = Wine {
            id: tables.last_wine_id,
            name: name.to_string(),
        };
        tables.wines.insert(wine.id, wine.clone());
        Ok(wine)
    }

    async fn insert_review(&self, review: &NewReview) -> AppResult<Review> {
        let mut tables = self.inner.write().await;
        if !tables.wines.contains_key(&review.wine_id) {
            return Err(AppError::NotFound(format!("wine {}", review.wine_id)));
        }

        tables.last_review_id += 1;
        let stored = Review {
            id: tables.last_review_id,
            wine_id: review.wine_id,
            user_name: review.user_name.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            pub_date: review.pub_date.unwrap_or_else(Utc::now),
        };
        tables.reviews.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_review(&self, id: i64) -> AppResult<Option<Review>> {
        let tables = self.inner.read().await;
        Ok(tables.reviews.get(&id).cloned())
    }

    async fn latest_reviews(&self, limit: usize) -> AppResult<Vec<Review>> {
        let tables = self.inner.read().await;
        let mut reviews: Vec<Review> = tables.reviews.values().cloned().collect();
        reviews.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        reviews.truncate(limit);
        Ok(reviews)
    }

    async fn list_wines(&self) -> AppResult<Vec<WineSummary>> {
        let tables = self.inner.read().await;
        let mut wines: Vec<WineSummary> = tables
            .wines
            .values()
            .map(|wine| WineSummary::from_reviews(wine, tables.reviews.values()))
            .collect();
        wines.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(wines)
    }

    async fn get_wine(&self, id: i64) -> AppResult<Option<WineDetail>> {
        let tables = self.inner.read().await;
        let Some(wine) = tables.wines.get(&id) else {
            return Ok(None);
        };

        let mut reviews: Vec<Review> = tables
            .reviews
            .values()
            .filter(|review| review.wine_id == id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));

        Ok(Some(WineDetail {
            summary: WineSummary::from_reviews(wine, &reviews),
            reviews,
        }))
    }
}
