//! Rating aggregation over review sets
//!
//! Pure computation on read; nothing is cached or stored.

use serde::Serialize;

use crate::models::Review;

/// Aggregated rating statistics for one establishment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewStats {
    /// Average score over scored reviews, rounded to one decimal.
    /// Absent when no review carries a score.
    pub average: Option<f64>,
    pub scored_count: usize,
    pub total_count: usize,
}

/// Compute rating statistics over a set of reviews
///
/// Reviews without a score count toward `total_count` only. Empty input
/// yields `{None, 0, 0}`.
pub fn compute<'a, I>(reviews: I) -> ReviewStats
where
    I: IntoIterator<Item = &'a Review>,
{
    let mut sum = 0.0;
    let mut scored_count = 0usize;
    let mut total_count = 0usize;

    for review in reviews {
        total_count += 1;
        if let Some(score) = review.score {
            sum += score;
            scored_count += 1;
        }
    }

    let average =
        (scored_count > 0).then(|| ((sum / scored_count as f64) * 10.0).round() / 10.0);

    ReviewStats {
        average,
        scored_count,
        total_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn review(score: Option<f64>) -> Review {
        Review {
            id: Uuid::new_v4(),
            establishment_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            score,
            comment: "ok".to_string(),
            role: None,
            contract: None,
            housing: None,
            housing_quality: None,
            split_shift: false,
            unpaid_overtime: false,
            toxic_manager: false,
            harassment: false,
            recommend: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_compute_empty() {
        let reviews: Vec<Review> = vec![];
        let stats = compute(&reviews);
        assert_eq!(
            stats,
            ReviewStats {
                average: None,
                scored_count: 0,
                total_count: 0
            }
        );
    }

    #[test]
    fn test_compute_ignores_unscored_reviews_in_average() {
        let reviews = vec![review(Some(4.0)), review(Some(5.0)), review(None)];
        let stats = compute(&reviews);
        assert_eq!(stats.average, Some(4.5));
        assert_eq!(stats.scored_count, 2);
        assert_eq!(stats.total_count, 3);
    }

    #[test]
    fn test_compute_all_unscored() {
        let reviews = vec![review(None), review(None)];
        let stats = compute(&reviews);
        assert_eq!(stats.average, None);
        assert_eq!(stats.scored_count, 0);
        assert_eq!(stats.total_count, 2);
    }

    #[test]
    fn test_compute_rounds_to_one_decimal() {
        let reviews = vec![review(Some(4.0)), review(Some(4.0)), review(Some(5.0))];
        let stats = compute(&reviews);
        assert_eq!(stats.average, Some(4.3));
    }

    #[test]
    fn test_compute_single_review() {
        let reviews = vec![review(Some(5.0))];
        let stats = compute(&reviews);
        assert_eq!(stats.average, Some(5.0));
        assert_eq!(stats.scored_count, 1);
        assert_eq!(stats.total_count, 1);
    }
}
