//! K-means partitioning of users in wine-rating space.
//!
//! The rating matrix stays sparse until it reaches the engine; here it is
//! expanded into a dense `Array2` where unrated cells are zero.

use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, SeedableRng};

use crate::error::ClusteringError;
use crate::services::rating_matrix::RatingMatrix;

/// Tuning knobs for [`ClusterEngine`]
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansConfig {
    /// Maximum Lloyd iterations per run
    pub max_iterations: usize,
    /// Convergence threshold on centroid movement; must be positive
    pub tolerance: f64,
    /// Number of k-means++ restarts; the lowest-inertia run is kept
    pub n_init: usize,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            tolerance: 1e-4,
            n_init: 10,
            seed: None,
        }
    }
}

/// Result of partitioning every matrix row
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Number of clusters; labels are `0..k`
    pub k: usize,
    /// Label of each matrix row, in row order
    pub labels: Vec<usize>,
    /// Sum of squared distances to the assigned centroids
    pub inertia: f64,
}

impl Partition {
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

/// Partitions users into `(num_users / 10) + 2` clusters
pub struct ClusterEngine {
    config: KMeansConfig,
}

impl ClusterEngine {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    /// Cluster count before clamping
    pub fn cluster_count(num_users: usize) -> usize {
        num_users / 10 + 2
    }

    /// Cluster count actually used: never more clusters than users
    pub fn effective_k(num_users: usize) -> Result<usize, ClusteringError> {
        if num_users == 0 {
            return Err(ClusteringError::Input(
                "cannot cluster an empty user set".to_string(),
            ));
        }
        Ok(Self::cluster_count(num_users).min(num_users))
    }

    /// Assigns every matrix row one label in `0..k`.
    ///
    /// Labels carry no meaning across calls. Clusters may end up empty.
    pub fn partition(&self, matrix: &RatingMatrix) -> Result<Partition, ClusteringError> {
        let k = Self::effective_k(matrix.num_rows())?;
        if matrix.num_columns() == 0 {
            return Err(ClusteringError::Input("rating matrix has no columns".to_string()));
        }
        if k < Self::cluster_count(matrix.num_rows()) {
            tracing::debug!(
                users = matrix.num_rows(),
                k,
                "Fewer users than requested clusters, clamping k"
            );
        }

        let records = dense_records(matrix);
        let dataset = DatasetBase::from(records.clone());

        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let model = KMeans::params_with_rng(k, rng)
            .n_runs(self.config.n_init.max(1))
            .max_n_iterations(self.config.max_iterations.max(1) as u64)
            .tolerance(self.config.tolerance)
            .fit(&dataset)
            .map_err(|e| ClusteringError::Algorithm(format!("k-means fit failed: {}", e)))?;

        let predictions: Array1<usize> = model.predict(&records);
        let labels: Vec<usize> = predictions.to_vec();

        let centroids = model.centroids();
        let inertia: f64 = records
            .rows()
            .into_iter()
            .zip(&labels)
            .map(|(row, &label)| {
                row.iter()
                    .zip(centroids.row(label))
                    .map(|(x, c)| (x - c) * (x - c))
                    .sum::<f64>()
            })
            .sum();

        if !inertia.is_finite() {
            return Err(ClusteringError::Algorithm(format!(
                "k-means produced non-finite inertia ({})",
                inertia
            )));
        }

        Ok(Partition { k, labels, inertia })
    }
}

/// Expands the sparse rows into a dense `users x wines` array
fn dense_records(matrix: &RatingMatrix) -> Array2<f64> {
    let mut records = Array2::zeros((matrix.num_rows(), matrix.num_columns()));
    for (i, row) in matrix.rows().iter().enumerate() {
        for (&column, &rating) in row {
            records[[i, column]] = f64::from(rating);
        }
    }
    records
}
