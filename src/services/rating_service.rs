//! Rating aggregation
//!
//! A book's `rating` and `review_count` are a pure function of its reviews:
//! the count, and the unweighted mean rounded half-up to 2 decimals (0.00 when
//! there are no reviews). `recompute` must run inside the same transaction as
//! the review write that triggered it, so a failed recompute rolls the review
//! write back with it.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use serde::Serialize;

use crate::domain::DomainError;
use crate::models::{book, review};

/// Derived rating columns of a book
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub rating: f64,
    pub review_count: i32,
}

impl RatingSummary {
    pub const EMPTY: RatingSummary = RatingSummary {
        rating: 0.0,
        review_count: 0,
    };
}

/// Convert a rating to integer hundredths.
pub fn to_hundredths(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Mean of `ratings` rounded half-up to 2 decimal places.
///
/// Arithmetic is done in integer hundredths so that e.g. a true mean of
/// 4.125 rounds to 4.13 rather than being at the mercy of binary floats.
pub fn summarize(ratings: &[f64]) -> RatingSummary {
    if ratings.is_empty() {
        return RatingSummary::EMPTY;
    }

    let count = ratings.len() as i64;
    let sum: i64 = ratings.iter().map(|r| to_hundredths(*r)).sum();
    // floor(sum / count + 1/2) for non-negative values
    let mean_hundredths = (2 * sum + count) / (2 * count);

    RatingSummary {
        rating: mean_hundredths as f64 / 100.0,
        review_count: count as i32,
    }
}

/// Recompute and persist `rating` / `review_count` for one book.
///
/// `conn` is normally the transaction carrying the review mutation.
pub async fn recompute<C>(conn: &C, book_id: i32) -> Result<RatingSummary, DomainError>
where
    C: ConnectionTrait,
{
    let ratings: Vec<f64> = review::Entity::find()
        .select_only()
        .column(review::Column::Rating)
        .filter(review::Column::BookId.eq(book_id))
        .into_tuple()
        .all(conn)
        .await?;

    let summary = summarize(&ratings);

    let result = book::Entity::update_many()
        .col_expr(book::Column::Rating, Expr::value(summary.rating))
        .col_expr(book::Column::ReviewCount, Expr::value(summary.review_count))
        .filter(book::Column::Id.eq(book_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::NotFound);
    }

    tracing::debug!(
        "Recomputed rating for book {}: {} ({} reviews)",
        book_id,
        summary.rating,
        summary.review_count
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_review_set_is_zero() {
        assert_eq!(summarize(&[]), RatingSummary::EMPTY);
    }

    #[test]
    fn mean_rounds_to_two_decimals() {
        let summary = summarize(&[5.0, 4.0, 3.5]);
        assert_eq!(summary.rating, 4.17);
        assert_eq!(summary.review_count, 3);

        let summary = summarize(&[5.0, 4.0]);
        assert_eq!(summary.rating, 4.5);
        assert_eq!(summary.review_count, 2);
    }

    #[test]
    fn rounding_is_half_up() {
        // 4.125 exactly
        let summary = summarize(&[4.5, 4.0, 4.0, 4.0, 4.5, 4.0, 4.0, 4.0]);
        assert_eq!(summary.rating, 4.13);

        // 1/3 and 2/3
        assert_eq!(summarize(&[1.0, 0.5, 0.5]).rating, 0.67);
        assert_eq!(summarize(&[1.0, 1.0, 0.5]).rating, 0.83);
    }

    #[test]
    fn single_review_is_its_own_mean() {
        assert_eq!(summarize(&[0.5]).rating, 0.5);
        assert_eq!(summarize(&[5.0]).rating, 5.0);
    }

    #[test]
    fn summary_is_order_independent() {
        assert_eq!(
            summarize(&[3.5, 5.0, 4.0]),
            summarize(&[5.0, 4.0, 3.5])
        );
    }
}
