use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::{CatalogRepository, ClusterRepository, RatingSource};
use crate::{
    error::{AppError, AppResult},
    models::{ClusterAssignment, NewReview, Review, StoredCluster, User, Wine, WineDetail, WineSummary},
};

/// Creates a PostgreSQL connection pool and applies pending migrations
pub async fn create_pool(database_url: &str, max_connections: u32) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    id: i64,
    name: String,
    username: Option<String>,
}

#[async_trait]
impl RatingSource for PgStore {
    async fn list_all_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT id, username FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn list_all_reviews(&self) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT id, wine_id, user_name, rating, comment, pub_date FROM reviews",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn count_reviews(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[async_trait]
impl ClusterRepository for PgStore {
    async fn replace_clusters(&self, clusters: &[ClusterAssignment]) -> AppResult<()> {
        // Dropping `tx` on any early return rolls the whole replacement back
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cluster_members")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM clusters").execute(&mut *tx).await?;

        // Clusters must exist before members can reference them
        let mut cluster_ids = Vec::with_capacity(clusters.len());
        for cluster in clusters {
            let id: i64 = sqlx::query_scalar("INSERT INTO clusters (name) VALUES ($1) RETURNING id")
                .bind(&cluster.name)
                .fetch_one(&mut *tx)
                .await?;
            cluster_ids.push(id);
        }

        for (cluster, cluster_id) in clusters.iter().zip(cluster_ids) {
            for username in &cluster.members {
                let linked = sqlx::query(
                    r#"
                    INSERT INTO cluster_members (cluster_id, user_id)
                    SELECT $1, id FROM users WHERE username = $2
                    "#,
                )
                .bind(cluster_id)
                .bind(username)
                .execute(&mut *tx)
                .await?;

                if linked.rows_affected() != 1 {
                    return Err(AppError::NotFound(format!("user {}", username)));
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_clusters(&self) -> AppResult<Vec<StoredCluster>> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT c.id, c.name, u.username
            FROM clusters c
            LEFT JOIN cluster_members m ON m.cluster_id = c.id
            LEFT JOIN users u ON u.id = m.user_id
            ORDER BY c.id, u.username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut clusters: BTreeMap<i64, StoredCluster> = BTreeMap::new();
        for row in rows {
            let cluster = clusters.entry(row.id).or_insert_with(|| StoredCluster {
                id: row.id,
                name: row.name,
                members: Vec::new(),
            });
            if let Some(username) = row.username {
                cluster.members.push(username);
            }
        }

        Ok(clusters.into_values().collect())
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn create_user(&self, username: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>("INSERT INTO users (username) VALUES ($1) RETURNING id, username")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::Conflict(format!("username {} is taken", username))
                }
                other => AppError::from(other),
            })
    }

    async fn create_wine(&self, name: &str) -> AppResult<Wine> {
        let wine = sqlx::query_as::<_, Wine>("INSERT INTO wines (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(wine)
    }

    async fn insert_review(&self, review: &NewReview) -> AppResult<Review> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (wine_id, user_name, rating, comment, pub_date)
            VALUES ($1, $2, $3, $4, COALESCE($5, now()))
            RETURNING id, wine_id, user_name, rating, comment, pub_date
            "#,
        )
        .bind(review.wine_id)
        .bind(&review.user_name)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.pub_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::NotFound(format!("wine {}", review.wine_id))
            }
            other => AppError::from(other),
        })
    }

    async fn get_review(&self, id: i64) -> AppResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(
            "SELECT id, wine_id, user_name, rating, comment, pub_date FROM reviews WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    async fn latest_reviews(&self, limit: usize) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, wine_id, user_name, rating, comment, pub_date
            FROM reviews
            ORDER BY pub_date DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn list_wines(&self) -> AppResult<Vec<WineSummary>> {
        let wines = sqlx::query_as::<_, WineSummary>(
            r#"
            SELECT w.id, w.name, AVG(r.rating)::float8 AS average_rating, COUNT(r.id) AS review_count
            FROM wines w
            LEFT JOIN reviews r ON r.wine_id = w.id
            GROUP BY w.id, w.name
            ORDER BY w.name DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(wines)
    }

    async fn get_wine(&self, id: i64) -> AppResult<Option<WineDetail>> {
        let Some(wine) = sqlx::query_as::<_, Wine>("SELECT id, name FROM wines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, wine_id, user_name, rating, comment, pub_date
            FROM reviews
            WHERE wine_id = $1
            ORDER BY pub_date DESC, id DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(WineDetail {
            summary: WineSummary::from_reviews(&wine, &reviews),
            reviews,
        }))
    }
}
