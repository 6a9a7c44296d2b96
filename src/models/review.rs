use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::MAX_USERNAME_LEN;
use crate::error::{AppError, AppResult};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;
pub const MAX_COMMENT_LEN: usize = 200;

/// How many reviews the "latest reviews" listing shows
pub const LATEST_REVIEWS_LIMIT: usize = 9;

/// A single rating of a wine by a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub wine_id: i64,
    pub user_name: String,
    pub rating: i32,
    pub comment: String,
    pub pub_date: DateTime<Utc>,
}

/// Payload for recording a review
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub wine_id: i64,
    pub user_name: String,
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
    /// Defaults to the time the review is recorded
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
}

impl NewReview {
    /// Checks the fields a store cannot be trusted to reject on its own
    pub fn validate(&self) -> AppResult<()> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(AppError::InvalidInput(format!(
                "rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, self.rating
            )));
        }
        if self.wine_id < 0 {
            return Err(AppError::InvalidInput(format!(
                "wine id must not be negative, got {}",
                self.wine_id
            )));
        }
        if self.user_name.trim().is_empty() {
            return Err(AppError::InvalidInput("user_name must not be empty".to_string()));
        }
        if self.user_name.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::InvalidInput(format!(
                "user_name must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }
        if self.comment.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::InvalidInput(format!(
                "comment must be at most {} characters",
                MAX_COMMENT_LEN
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_review(rating: i32) -> NewReview {
        NewReview {
            wine_id: 1,
            user_name: "alice".to_string(),
            rating,
            comment: "Bright acidity".to_string(),
            pub_date: None,
        }
    }

    #[test]
    fn test_ratings_in_range_are_accepted() {
        for rating in MIN_RATING..=MAX_RATING {
            assert!(new_review(rating).validate().is_ok());
        }
    }

    #[test]
    fn test_ratings_out_of_range_are_rejected() {
        for rating in [0, 6, -1] {
            assert!(matches!(
                new_review(rating).validate(),
                Err(AppError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_long_comment_is_rejected() {
        let mut review = new_review(4);
        review.comment = "x".repeat(MAX_COMMENT_LEN + 1);
        assert!(review.validate().is_err());
    }

    #[test]
    fn test_long_user_name_is_rejected() {
        let mut review = new_review(4);
        review.user_name = "a".repeat(MAX_USERNAME_LEN);
        assert!(review.validate().is_ok());

        review.user_name.push('a');
        assert!(matches!(review.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_new_review_deserializes_without_optional_fields() {
        let review: NewReview =
            serde_json::from_str(r#"{"wine_id": 2, "user_name": "bob", "rating": 3}"#).unwrap();
        assert_eq!(review.comment, "");
        assert_eq!(review.pub_date, None);
    }
}
