//! Book recommendations
//!
//! A candidate is eligible when it is not the source book and either shares
//! its genre (exact string match) or has a rating within ±0.50 of the source,
//! with the window clamped to [0.00, 5.00]. Eligible books are ordered by:
//!
//! 1. genre match before non-match
//! 2. ascending |candidate.rating - source.rating|
//! 3. descending review_count
//! 4. ascending id
//!
//! All rating comparisons use integer hundredths.

use std::cmp::Reverse;

use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter};
use serde::Serialize;

use crate::domain::DomainError;
use crate::models::book::{self, Book};
use crate::services::rating_service::to_hundredths;

/// Half-width of the rating neighbourhood, in hundredths
pub const RATING_WINDOW: i64 = 50;
/// Highest possible book rating, in hundredths
pub const MAX_RATING: i64 = 500;

/// Inclusive rating-proximity window around `rating`, in hundredths
pub fn rating_window(rating: f64) -> (i64, i64) {
    let center = to_hundredths(rating);
    (
        (center - RATING_WINDOW).max(0),
        (center + RATING_WINDOW).min(MAX_RATING),
    )
}

pub fn is_eligible(source: &book::Model, candidate: &book::Model) -> bool {
    if candidate.id == source.id {
        return false;
    }
    if candidate.genre == source.genre {
        return true;
    }
    let (low, high) = rating_window(source.rating);
    let rating = to_hundredths(candidate.rating);
    low <= rating && rating <= high
}

type RankKey = (u8, i64, Reverse<i32>, i32);

fn rank_key(source: &book::Model, candidate: &book::Model) -> RankKey {
    let bucket = if candidate.genre == source.genre { 1 } else { 2 };
    let distance = (to_hundredths(candidate.rating) - to_hundredths(source.rating)).abs();
    (bucket, distance, Reverse(candidate.review_count), candidate.id)
}

/// Filter `candidates` down to eligible books and order them, keeping at
/// most `limit`.
pub fn rank<I>(source: &book::Model, candidates: I, limit: usize) -> Vec<book::Model>
where
    I: IntoIterator<Item = book::Model>,
{
    let mut eligible: Vec<book::Model> = candidates
        .into_iter()
        .filter(|candidate| is_eligible(source, candidate))
        .collect();

    eligible.sort_by_cached_key(|candidate| rank_key(source, candidate));
    eligible.truncate(limit);
    eligible
}

/// Recommendations for one book
#[derive(Debug, Serialize)]
pub struct Recommendations {
    pub source: Book,
    pub books: Vec<Book>,
}

/// Load the source book and rank the catalog against it.
pub async fn recommend<C>(
    conn: &C,
    book_id: i32,
    limit: usize,
) -> Result<Recommendations, DomainError>
where
    C: ConnectionTrait,
{
    let source = book::Entity::find_by_id(book_id)
        .one(conn)
        .await?
        .ok_or(DomainError::NotFound)?;

    if limit == 0 {
        return Ok(Recommendations {
            source: Book::from(source),
            books: Vec::new(),
        });
    }

    // Coarse pre-filter in SQL, padded by half a hundredth so float storage
    // never drops a boundary candidate. `rank` applies the exact predicate.
    let (low, high) = rating_window(source.rating);
    let candidates = book::Entity::find()
        .filter(book::Column::Id.ne(source.id))
        .filter(
            Condition::any()
                .add(book::Column::Genre.eq(source.genre.as_str()))
                .add(book::Column::Rating.between(
                    (low as f64 - 0.5) / 100.0,
                    (high as f64 + 0.5) / 100.0,
                )),
        )
        .all(conn)
        .await?;

    let ranked = rank(&source, candidates, limit);

    tracing::debug!(
        "Recommendations for book {} (genre={:?}, rating={}): {} books",
        source.id,
        source.genre,
        source.rating,
        ranked.len()
    );

    Ok(Recommendations {
        source: Book::from(source),
        books: ranked.into_iter().map(Book::from).collect(),
    })
}
