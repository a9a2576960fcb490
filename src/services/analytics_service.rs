//! Catalog statistics for the admin dashboard and public counters
//!
//! Read-only aggregate queries. Grouped counts are plain SQL over the SQLite
//! schema; list sections reuse the entity query builder.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Statement, Value,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::DomainError;
use crate::models::user::ROLE_USER;
use crate::models::{Book, Review, book, favorite, review, user};
use crate::services::rating_service;

#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult, ToSchema)]
pub struct GenreCount {
    pub genre: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult, ToSchema)]
pub struct YearCount {
    pub publication_year: i32,
    pub count: i64,
}

/// Reviews whose rating falls in `[rating, rating + 1)`
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult, ToSchema)]
pub struct RatingBucket {
    pub rating: i32,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult, ToSchema)]
pub struct DailyCount {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult, ToSchema)]
pub struct FavoritedBook {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub cover_image: Option<String>,
    pub rating: f64,
    pub favorites_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult, ToSchema)]
pub struct UserCount {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Totals {
    pub books: u64,
    pub users: u64,
    pub reviews: u64,
    pub favorites: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Dashboard {
    pub totals: Totals,
    pub genre_distribution: Vec<GenreCount>,
    pub top_rated: Vec<Book>,
    pub most_reviewed: Vec<Book>,
    pub most_favorited: Vec<FavoritedBook>,
    pub recent_reviews: Vec<Review>,
    pub books_by_year: Vec<YearCount>,
    pub rating_distribution: Vec<RatingBucket>,
    pub active_users: Vec<UserCount>,
    pub books_per_day: Vec<DailyCount>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookStatistics {
    pub total_books: u64,
    /// Sum of every book's review_count
    pub total_reviews: i64,
    /// Mean of book ratings, 2 decimals
    pub average_rating: f64,
    pub top_rated: Vec<Book>,
    pub most_reviewed: Vec<Book>,
    pub genre_distribution: Vec<GenreCount>,
    pub books_by_year: Vec<YearCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PublicStats {
    pub books: u64,
    /// Accounts with the `user` role
    pub users: u64,
    pub reviews: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserFavoriteStatistics {
    pub total: u64,
    pub genres: Vec<GenreCount>,
    pub recent: Vec<Book>,
    pub top_rated: Vec<Book>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminFavoriteStatistics {
    pub total: u64,
    pub most_favorited: Vec<FavoritedBook>,
    pub top_users: Vec<UserCount>,
}

async fn raw<T: FromQueryResult>(
    db: &DatabaseConnection,
    sql: &str,
    values: Vec<Value>,
) -> Result<Vec<T>, DomainError> {
    let stmt = Statement::from_sql_and_values(db.get_database_backend(), sql, values);
    Ok(T::find_by_statement(stmt).all(db).await?)
}

async fn genre_distribution(
    db: &DatabaseConnection,
    limit: i64,
) -> Result<Vec<GenreCount>, DomainError> {
    raw(
        db,
        "SELECT genre, COUNT(*) AS count FROM books \
         GROUP BY genre ORDER BY count DESC, genre ASC LIMIT ?",
        vec![limit.into()],
    )
    .await
}

async fn books_by_year(db: &DatabaseConnection, limit: i64) -> Result<Vec<YearCount>, DomainError> {
    raw(
        db,
        "SELECT publication_year, COUNT(*) AS count FROM books \
         GROUP BY publication_year ORDER BY publication_year DESC LIMIT ?",
        vec![limit.into()],
    )
    .await
}

async fn most_favorited(
    db: &DatabaseConnection,
    limit: i64,
) -> Result<Vec<FavoritedBook>, DomainError> {
    raw(
        db,
        "SELECT b.id, b.title, b.author, b.genre, b.cover_image, b.rating, \
                COUNT(f.id) AS favorites_count \
         FROM books b JOIN favorites f ON f.book_id = b.id \
         GROUP BY b.id ORDER BY favorites_count DESC, b.id ASC LIMIT ?",
        vec![limit.into()],
    )
    .await
}

async fn top_rated(db: &DatabaseConnection, limit: u64) -> Result<Vec<Book>, DomainError> {
    let books = book::Entity::find()
        .order_by_desc(book::Column::Rating)
        .order_by_desc(book::Column::ReviewCount)
        .order_by_asc(book::Column::Id)
        .limit(limit)
        .all(db)
        .await?;
    Ok(books.into_iter().map(Book::from).collect())
}

async fn most_reviewed(db: &DatabaseConnection, limit: u64) -> Result<Vec<Book>, DomainError> {
    let books = book::Entity::find()
        .order_by_desc(book::Column::ReviewCount)
        .order_by_desc(book::Column::Rating)
        .order_by_asc(book::Column::Id)
        .limit(limit)
        .all(db)
        .await?;
    Ok(books.into_iter().map(Book::from).collect())
}

async fn recent_reviews(db: &DatabaseConnection, limit: u64) -> Result<Vec<Review>, DomainError> {
    let rows = review::Entity::find()
        .find_also_related(user::Entity)
        .order_by_desc(review::Column::CreatedAt)
        .order_by_desc(review::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    let book_ids: HashSet<i32> = rows.iter().map(|(r, _)| r.book_id).collect();
    let books: HashMap<i32, book::Model> = book::Entity::find()
        .filter(book::Column::Id.is_in(book_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();

    Ok(rows
        .into_iter()
        .map(|(r, reviewer)| {
            let book = books.get(&r.book_id).cloned();
            let mut dto = Review::from(r);
            if let Some(u) = reviewer {
                dto = dto.with_user(u);
            }
            if let Some(b) = book {
                dto = dto.with_book(b);
            }
            dto
        })
        .collect())
}

/// Everything shown on the admin dashboard
pub async fn dashboard(db: &DatabaseConnection) -> Result<Dashboard, DomainError> {
    let totals = Totals {
        books: book::Entity::find().count(db).await?,
        users: user::Entity::find().count(db).await?,
        reviews: review::Entity::find().count(db).await?,
        favorites: favorite::Entity::find().count(db).await?,
    };

    let rating_distribution = raw(
        db,
        "SELECT CAST(rating AS INTEGER) AS rating, COUNT(*) AS count FROM reviews \
         GROUP BY CAST(rating AS INTEGER) ORDER BY rating ASC",
        vec![],
    )
    .await?;

    let active_users = raw(
        db,
        "SELECT u.id, u.name, u.email, COUNT(r.id) AS count \
         FROM users u JOIN reviews r ON r.user_id = u.id \
         GROUP BY u.id ORDER BY count DESC, u.id ASC LIMIT 10",
        vec![],
    )
    .await?;

    // created_at is fixed-width RFC 3339, so its first 10 chars are the date
    let since = (Utc::now() - Duration::days(30)).format("%Y-%m-%d").to_string();
    let books_per_day = raw(
        db,
        "SELECT substr(created_at, 1, 10) AS date, COUNT(*) AS count FROM books \
         WHERE substr(created_at, 1, 10) >= ? GROUP BY date ORDER BY date ASC",
        vec![since.into()],
    )
    .await?;

    Ok(Dashboard {
        totals,
        genre_distribution: genre_distribution(db, 10).await?,
        top_rated: top_rated(db, 10).await?,
        most_reviewed: most_reviewed(db, 10).await?,
        most_favorited: most_favorited(db, 10).await?,
        recent_reviews: recent_reviews(db, 10).await?,
        books_by_year: books_by_year(db, 10).await?,
        rating_distribution,
        active_users,
        books_per_day,
    })
}

/// Catalog-wide book statistics
pub async fn book_statistics(db: &DatabaseConnection) -> Result<BookStatistics, DomainError> {
    let columns: Vec<(f64, i32)> = book::Entity::find()
        .select_only()
        .column(book::Column::Rating)
        .column(book::Column::ReviewCount)
        .into_tuple()
        .all(db)
        .await?;

    let ratings: Vec<f64> = columns.iter().map(|(rating, _)| *rating).collect();
    let total_reviews: i64 = columns.iter().map(|(_, count)| i64::from(*count)).sum();

    Ok(BookStatistics {
        total_books: columns.len() as u64,
        total_reviews,
        average_rating: rating_service::summarize(&ratings).rating,
        top_rated: top_rated(db, 5).await?,
        most_reviewed: most_reviewed(db, 5).await?,
        genre_distribution: genre_distribution(db, -1).await?,
        books_by_year: books_by_year(db, 10).await?,
    })
}

/// Counters shown on the public landing page
pub async fn public_stats(db: &DatabaseConnection) -> Result<PublicStats, DomainError> {
    Ok(PublicStats {
        books: book::Entity::find().count(db).await?,
        users: user::Entity::find()
            .filter(user::Column::Role.eq(ROLE_USER))
            .count(db)
            .await?,
        reviews: review::Entity::find().count(db).await?,
    })
}

/// Breakdown of one user's favorites
pub async fn user_favorite_statistics(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<UserFavoriteStatistics, DomainError> {
    let total = favorite::Entity::find()
        .filter(favorite::Column::UserId.eq(user_id))
        .count(db)
        .await?;

    let genres = raw(
        db,
        "SELECT b.genre, COUNT(*) AS count \
         FROM favorites f JOIN books b ON b.id = f.book_id \
         WHERE f.user_id = ? GROUP BY b.genre ORDER BY count DESC, b.genre ASC",
        vec![user_id.into()],
    )
    .await?;

    let favorites = || {
        book::Entity::find()
            .join(JoinType::InnerJoin, book::Relation::Favorites.def())
            .filter(favorite::Column::UserId.eq(user_id))
    };

    let recent = favorites()
        .order_by_desc(favorite::Column::CreatedAt)
        .order_by_desc(favorite::Column::Id)
        .limit(5)
        .all(db)
        .await?;

    let top_rated = favorites()
        .order_by_desc(book::Column::Rating)
        .order_by_asc(book::Column::Id)
        .limit(5)
        .all(db)
        .await?;

    Ok(UserFavoriteStatistics {
        total,
        genres,
        recent: recent.into_iter().map(Book::from).collect(),
        top_rated: top_rated.into_iter().map(Book::from).collect(),
    })
}

/// Catalog-wide favorite statistics
pub async fn admin_favorite_statistics(
    db: &DatabaseConnection,
) -> Result<AdminFavoriteStatistics, DomainError> {
    let top_users = raw(
        db,
        "SELECT u.id, u.name, u.email, COUNT(f.id) AS count \
         FROM users u JOIN favorites f ON f.user_id = u.id \
         GROUP BY u.id ORDER BY count DESC, u.id ASC LIMIT 10",
        vec![],
    )
    .await?;

    Ok(AdminFavoriteStatistics {
        total: favorite::Entity::find().count(db).await?,
        most_favorited: most_favorited(db, 10).await?,
        top_users,
    })
}
