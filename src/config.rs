use serde::Deserialize;

use crate::services::kmeans::KMeansConfig;

/// How a review submission runs a triggered clustering pass
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClusteringMode {
    /// Await the pass before answering the submission
    #[default]
    Inline,
    /// Spawn the pass onto the runtime and answer immediately
    Background,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL; the in-memory store is used when unset
    #[serde(default)]
    pub database_url: Option<String>,

    /// Upper bound on pooled PostgreSQL connections
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Fallback log filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub clustering_mode: ClusteringMode,

    #[serde(default = "default_kmeans_max_iterations")]
    pub kmeans_max_iterations: usize,

    #[serde(default = "default_kmeans_tolerance")]
    pub kmeans_tolerance: f64,

    /// Number of k-means restarts; the lowest-inertia run wins
    #[serde(default = "default_kmeans_n_init")]
    pub kmeans_n_init: usize,

    /// Fixed seed for reproducible partitions
    #[serde(default)]
    pub kmeans_seed: Option<u64>,
}

fn default_max_connections() -> u32 {
    5
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_kmeans_max_iterations() -> usize {
    300
}

fn default_kmeans_tolerance() -> f64 {
    1e-4
}

fn default_kmeans_n_init() -> usize {
    10
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// K-means settings with out-of-range values pulled back to something usable
    pub fn kmeans(&self) -> KMeansConfig {
        KMeansConfig {
            max_iterations: self.kmeans_max_iterations.max(1),
            tolerance: if self.kmeans_tolerance > 0.0 {
                self.kmeans_tolerance
            } else {
                default_kmeans_tolerance()
            },
            n_init: self.kmeans_n_init.max(1),
            seed: self.kmeans_seed,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
