//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use super::DomainError;
use crate::models::book::Book;
use crate::models::review::Review;

/// Sort order for the catalog listing. Unknown keys fall back to `Newest`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    TitleAsc,
    TitleDesc,
    RatingHigh,
    RatingLow,
    Popular,
}

impl SortKey {
    pub fn parse(key: &str) -> Self {
        match key {
            "newest" => SortKey::Newest,
            "oldest" => SortKey::Oldest,
            "title_asc" | "title" => SortKey::TitleAsc,
            "title_desc" => SortKey::TitleDesc,
            "rating_high" | "rating" => SortKey::RatingHigh,
            "rating_low" => SortKey::RatingLow,
            "popular" => SortKey::Popular,
            _ => SortKey::Newest,
        }
    }
}

/// Upper bound on `per_page` for every paginated listing
pub const MAX_PER_PAGE: u64 = 1000;

/// Zero-based index of the 1-based `page`, or `None` when that page starts
/// past the last of `total` rows. Offsets that overflow count as past the end.
pub fn page_index(page: u64, per_page: u64, total: u64) -> Option<u64> {
    let index = page.max(1) - 1;
    let offset = index.checked_mul(per_page)?;
    (offset < total).then_some(index)
}

/// Filter criteria for book queries
#[derive(Debug, Default, Clone)]
pub struct BookFilter {
    /// Case-insensitive substring of title or author
    pub search: Option<String>,
    /// Exact genre label
    pub genre: Option<String>,
    pub min_rating: Option<f64>,
    /// Exact publication year
    pub year: Option<i32>,
    pub sort: SortKey,
    /// 1-based page number
    pub page: Option<u64>,
    /// `None` or `Some(0)` returns every match, capped at `MAX_PER_PAGE`
    pub per_page: Option<u64>,
}

/// Paginated result with total count
#[derive(Debug)]
pub struct PaginatedBooks {
    pub books: Vec<Book>,
    pub total: u64,
}

/// Paginated reviews with total count
#[derive(Debug)]
pub struct PaginatedReviews {
    pub reviews: Vec<Review>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Validated catalog entry ready to be inserted
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub genre: String,
    pub description: String,
    pub cover_image: Option<String>,
}

/// Partial catalog update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_year: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

// Distinguishes an explicit `null` from an absent key.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Review payload for create and update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewInput {
    pub rating: Option<f64>,
    /// Absent: keep the current comment. `null`: clear it.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub comment: Option<Option<String>>,
}

/// Filters for the administrator review listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminReviewFilter {
    /// Matches book title/author or reviewer name/email
    pub search: Option<String>,
    pub book_id: Option<i32>,
    pub user_id: Option<i32>,
    pub rating: Option<f64>,
    pub min_rating: Option<f64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Filters for a user's favorites listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FavoriteFilter {
    pub genre: Option<String>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Repository trait for Book entity
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Find all books matching the filter criteria with pagination support
    async fn find_all(&self, filter: BookFilter) -> Result<PaginatedBooks, DomainError>;

    /// Find a single book by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError>;

    /// Distinct genre labels present in the catalog
    async fn genres(&self) -> Result<Vec<String>, DomainError>;

    /// True when a book with exactly this title and author exists
    async fn exists(&self, title: &str, author: &str) -> Result<bool, DomainError>;

    /// Create a new book with rating 0.00 and no reviews
    async fn create(&self, book: NewBook) -> Result<Book, DomainError>;

    /// Update catalog fields of an existing book
    async fn update(&self, id: i32, changes: BookChanges) -> Result<Book, DomainError>;

    /// Delete a book together with its reviews and favorites.
    /// Returns the deleted book.
    async fn delete(&self, id: i32) -> Result<Book, DomainError>;
}

/// Repository trait for Review entity.
///
/// Every mutation recomputes the parent book's rating in the same transaction.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Reviews of a book, newest first
    async fn find_by_book(
        &self,
        book_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<PaginatedReviews, DomainError>;

    /// The `limit` most recent reviews of a book, with reviewer
    async fn latest_for_book(&self, book_id: i32, limit: u64) -> Result<Vec<Review>, DomainError>;

    /// A user's review of a book
    async fn find_user_review(
        &self,
        user_id: i32,
        book_id: i32,
    ) -> Result<Option<Review>, DomainError>;

    /// All reviews written by a user, newest first, with book summary
    async fn find_by_user(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<PaginatedReviews, DomainError>;

    /// Administrator listing with filters
    async fn find_all(&self, filter: AdminReviewFilter) -> Result<Vec<Review>, DomainError>;

    /// Create a review. `Conflict` if the user already reviewed the book.
    async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        input: ReviewInput,
    ) -> Result<Review, DomainError>;

    /// Update the user's own review
    async fn update(
        &self,
        user_id: i32,
        book_id: i32,
        review_id: i32,
        input: ReviewInput,
    ) -> Result<Review, DomainError>;

    /// Delete the user's own review
    async fn delete_own(
        &self,
        user_id: i32,
        book_id: i32,
        review_id: i32,
    ) -> Result<(), DomainError>;

    /// Delete any review (moderation)
    async fn delete(&self, review_id: i32) -> Result<(), DomainError>;
}

/// Repository trait for Favorite entity
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Books favorited by a user, most recently favorited first
    async fn find_by_user(
        &self,
        user_id: i32,
        filter: FavoriteFilter,
    ) -> Result<PaginatedBooks, DomainError>;

    /// Add the book if absent, remove it if present.
    /// Returns whether the book is a favorite afterwards.
    async fn toggle(&self, user_id: i32, book_id: i32) -> Result<bool, DomainError>;

    async fn is_favorited(&self, user_id: i32, book_id: i32) -> Result<bool, DomainError>;

    /// `NotFound` when the book is not among the user's favorites
    async fn remove(&self, user_id: i32, book_id: i32) -> Result<(), DomainError>;
}
