use crate::{
    db::ClusterRepository,
    error::ClusteringError,
    models::ClusterAssignment,
    services::kmeans::Partition,
};

/// Turns a partition into cluster records and swaps them into the store
pub struct ClusterSynchronizer;

impl ClusterSynchronizer {
    /// Builds all `k` clusters in memory, empty ones included, named by label
    pub fn assemble(
        usernames: &[String],
        partition: &Partition,
    ) -> Result<Vec<ClusterAssignment>, ClusteringError> {
        if usernames.len() != partition.labels.len() {
            return Err(ClusteringError::Input(format!(
                "{} labels for {} users",
                partition.labels.len(),
                usernames.len()
            )));
        }

        let mut clusters: Vec<ClusterAssignment> =
            (0..partition.k).map(ClusterAssignment::empty).collect();

        for (username, &label) in usernames.iter().zip(&partition.labels) {
            let cluster = clusters.get_mut(label).ok_or_else(|| {
                ClusteringError::Input(format!(
                    "label {} out of range for {} clusters",
                    label, partition.k
                ))
            })?;
            cluster.members.push(username.clone());
        }

        Ok(clusters)
    }

    /// Replaces the persisted cluster set in one transactional store call
    pub async fn commit<S: ClusterRepository + ?Sized>(
        store: &S,
        clusters: &[ClusterAssignment],
    ) -> Result<(), ClusteringError> {
        store
            .replace_clusters(clusters)
            .await
            .map_err(ClusteringError::store)
    }
}
