//! Sparse user × wine rating matrix.
//!
//! Rows follow the order of the user list handed to [`RatingMatrix::build`];
//! columns are wine ids. Absent cells mean "not rated" and are never stored
//! as zero.

use std::collections::{BTreeMap, HashMap};

use crate::models::{Review, User};

/// One user's ratings keyed by wine id (column)
pub type SparseRow = BTreeMap<usize, f32>;

#[derive(Debug, Clone, PartialEq)]
pub struct RatingMatrix {
    usernames: Vec<String>,
    rows: Vec<SparseRow>,
    num_columns: usize,
}

impl RatingMatrix {
    /// Builds the matrix from a snapshot of all users and all reviews.
    ///
    /// When a user rated the same wine more than once, the chronologically
    /// last review wins (ties broken by review id). Reviews by unknown users
    /// and reviews with a negative wine id contribute nothing.
    pub fn build(users: &[User], reviews: &[Review]) -> Self {
        let usernames: Vec<String> = users.iter().map(|u| u.username.clone()).collect();
        let row_of: HashMap<&str, usize> = usernames
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut ordered: Vec<&Review> = reviews.iter().collect();
        ordered.sort_by(|a, b| a.pub_date.cmp(&b.pub_date).then(a.id.cmp(&b.id)));

        let mut rows = vec![SparseRow::new(); usernames.len()];
        let mut max_wine_id: Option<usize> = None;

        for review in ordered {
            let Ok(column) = usize::try_from(review.wine_id) else {
                tracing::warn!(review_id = review.id, wine_id = review.wine_id, "Skipping review with negative wine id");
                continue;
            };
            max_wine_id = max_wine_id.max(Some(column));

            match row_of.get(review.user_name.as_str()) {
                Some(&row) => {
                    rows[row].insert(column, review.rating as f32);
                }
                None => {
                    tracing::debug!(
                        review_id = review.id,
                        user_name = %review.user_name,
                        "Review author is not a registered user"
                    );
                }
            }
        }

        Self {
            usernames,
            rows,
            // One column per id up to the largest reviewed wine; never zero wide
            num_columns: max_wine_id.map_or(1, |max| max + 1),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Usernames in row order
    pub fn usernames(&self) -> &[String] {
        &self.usernames
    }

    pub fn rows(&self) -> &[SparseRow] {
        &self.rows
    }

    /// Rating stored at (`row`, `wine_id`), `None` when unrated
    pub fn get(&self, row: usize, wine_id: usize) -> Option<f32> {
        self.rows.get(row)?.get(&wine_id).copied()
    }

    /// Number of stored ratings
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(BTreeMap::len).sum()
    }
}
