//! Public catalog handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::api::error_response;
use crate::domain::{BookFilter, MAX_PER_PAGE, SortKey};
use crate::infrastructure::AppState;
use crate::services::recommendation_service;

pub const DEFAULT_PER_PAGE: u64 = 1000;
pub const LATEST_REVIEWS_ON_DETAIL: u64 = 5;

/// Query string of `GET /books`. Numeric fields are parsed leniently so an
/// empty or malformed value behaves as if absent.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListBooksQuery {
    /// Substring of title or author
    pub search: Option<String>,
    pub genre: Option<String>,
    pub min_rating: Option<String>,
    pub year: Option<String>,
    /// newest, oldest, title_asc, title_desc, rating_high, rating_low, popular
    pub sort: Option<String>,
    /// Alias of `sort`
    pub sort_by: Option<String>,
    pub page: Option<String>,
    /// 0 returns every match
    pub per_page: Option<String>,
}

fn parse<T: std::str::FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

impl ListBooksQuery {
    pub fn to_filter(&self) -> BookFilter {
        let sort = self
            .sort
            .as_deref()
            .or(self.sort_by.as_deref())
            .map(SortKey::parse)
            .unwrap_or_default();

        BookFilter {
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            genre: self.genre.clone().filter(|s| !s.is_empty()),
            min_rating: parse(&self.min_rating),
            year: parse(&self.year),
            sort,
            page: Some(parse(&self.page).unwrap_or(1).max(1)),
            per_page: Some(
                parse(&self.per_page)
                    .unwrap_or(DEFAULT_PER_PAGE)
                    .min(MAX_PER_PAGE),
            ),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/books",
    params(ListBooksQuery),
    responses(
        (status = 200, description = "Filtered and sorted catalog")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListBooksQuery>,
) -> impl IntoResponse {
    let filter = query.to_filter();
    let (page, per_page) = (filter.page, filter.per_page);

    match state.book_repo.find_all(filter).await {
        Ok(result) => Json(json!({
            "success": true,
            "data": result.books,
            "total": result.total,
            "page": page,
            "per_page": per_page
        }))
        .into_response(),
        Err(e) => error_response(e, "Book not found"),
    }
}

#[utoipa::path(
    get,
    path = "/api/books/genres",
    responses(
        (status = 200, description = "Distinct genre labels")
    )
)]
pub async fn list_genres(State(state): State<AppState>) -> impl IntoResponse {
    match state.book_repo.genres().await {
        Ok(genres) => Json(json!({ "success": true, "data": genres })).into_response(),
        Err(e) => error_response(e, ""),
    }
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book with latest reviews and similar books"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    let limit = state.config.recommendations.detail;
    let similar = match recommendation_service::recommend(state.db(), id, limit).await {
        Ok(r) => r,
        Err(e) => return error_response(e, "Book not found"),
    };

    let reviews = match state
        .review_repo
        .latest_for_book(id, LATEST_REVIEWS_ON_DETAIL)
        .await
    {
        Ok(r) => r,
        Err(e) => return error_response(e, "Book not found"),
    };

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": similar.source,
            "reviews": reviews,
            "similar_books": similar.books
        })),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/books/{id}/recommendations",
    params(("id" = i32, Path, description = "Source book id")),
    responses(
        (status = 200, description = "Ranked recommendations"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn recommendations(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let limit = state.config.recommendations.more;
    match recommendation_service::recommend(state.db(), id, limit).await {
        Ok(result) => Json(json!({
            "success": true,
            "data": result.books,
            "based_on": {
                "book_id": result.source.id,
                "genre": result.source.genre,
                "rating": result.source.rating
            }
        }))
        .into_response(),
        Err(e) => error_response(e, "Book not found"),
    }
}
