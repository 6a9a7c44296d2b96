use serde::{Deserialize, Serialize};

/// One cluster produced by a clustering pass.
///
/// Plain data: the label only means something within the pass that produced
/// it, and the whole set is replaced on the next pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterAssignment {
    pub label: usize,
    pub name: String,
    pub members: Vec<String>,
}

impl ClusterAssignment {
    pub fn empty(label: usize) -> Self {
        Self {
            label,
            name: label.to_string(),
            members: Vec::new(),
        }
    }
}

/// A cluster as currently persisted, with its store-assigned id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredCluster {
    pub id: i64,
    pub name: String,
    /// Member usernames, sorted
    pub members: Vec<String>,
}
