use serde::{Deserialize, Serialize};

use super::Review;

pub const MAX_WINE_NAME_LEN: usize = 200;

/// A wine as stored in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Wine {
    pub id: i64,
    pub name: String,
}

/// Payload for adding a wine to the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct NewWine {
    pub name: String,
}

/// A wine together with its aggregated ratings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct WineSummary {
    pub id: i64,
    pub name: String,
    /// Mean of all review ratings, `None` until the wine is reviewed
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

impl WineSummary {
    /// Aggregates the given reviews of `wine`
    pub fn from_reviews<'a>(wine: &Wine, reviews: impl IntoIterator<Item = &'a Review>) -> Self {
        let (sum, count) = reviews
            .into_iter()
            .filter(|review| review.wine_id == wine.id)
            .fold((0i64, 0i64), |(sum, count), review| {
                (sum + i64::from(review.rating), count + 1)
            });

        Self {
            id: wine.id,
            name: wine.name.clone(),
            average_rating: (count > 0).then(|| sum as f64 / count as f64),
            review_count: count,
        }
    }
}

/// A wine with every review written about it
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WineDetail {
    #[serde(flatten)]
    pub summary: WineSummary,
    pub reviews: Vec<Review>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn review(id: i64, wine_id: i64, rating: i32) -> Review {
        Review {
            id,
            wine_id,
            user_name: format!("user{}", id),
            rating,
            comment: String::new(),
            pub_date: Utc::now(),
        }
    }

    #[test]
    fn test_average_rating_is_mean_of_matching_reviews() {
        let wine = Wine {
            id: 3,
            name: "Rioja Reserva".to_string(),
        };
        let reviews = vec![review(1, 3, 5), review(2, 3, 2), review(3, 4, 1)];

        let summary = WineSummary::from_reviews(&wine, &reviews);
        assert_eq!(summary.review_count, 2);
        assert_eq!(summary.average_rating, Some(3.5));
    }

    #[test]
    fn test_unreviewed_wine_has_no_average() {
        let wine = Wine {
            id: 9,
            name: "Txakoli".to_string(),
        };
        let summary = WineSummary::from_reviews(&wine, &[]);
        assert_eq!(summary.review_count, 0);
        assert_eq!(summary.average_rating, None);
    }
}
