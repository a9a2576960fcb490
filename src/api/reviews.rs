//! Review handlers
//!
//! Every write goes through the review repository, which recomputes the
//! book's rating before the response is produced. The book summary returned
//! with a write therefore already reflects it.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::error_response;
use crate::domain::{AdminReviewFilter, DomainError, ReviewInput};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::{AdminUser, AuthUser};

pub const REVIEWS_PER_PAGE: u64 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PageQuery {
    fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    fn per_page(&self) -> u64 {
        self.per_page.filter(|n| *n > 0).unwrap_or(REVIEWS_PER_PAGE)
    }
}

/// Rating columns of a book after a review write
async fn book_summary(state: &AppState, book_id: i32) -> serde_json::Value {
    match state.book_repo.find_by_id(book_id).await {
        Ok(Some(book)) => json!({
            "id": book.id,
            "rating": book.rating,
            "review_count": book.review_count
        }),
        _ => serde_json::Value::Null,
    }
}

#[utoipa::path(
    get,
    path = "/api/books/{id}/reviews",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Reviews of the book, newest first"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn list_book_reviews(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let book = match state.book_repo.find_by_id(book_id).await {
        Ok(Some(b)) => b,
        Ok(None) => return error_response(DomainError::NotFound, "Book not found"),
        Err(e) => return error_response(e, ""),
    };

    match state
        .review_repo
        .find_by_book(book_id, query.page(), query.per_page())
        .await
    {
        Ok(result) => Json(json!({
            "success": true,
            "book": {
                "id": book.id,
                "title": book.title,
                "rating": book.rating,
                "review_count": book.review_count
            },
            "data": result.reviews,
            "total": result.total,
            "page": result.page,
            "per_page": result.per_page
        }))
        .into_response(),
        Err(e) => error_response(e, "Book not found"),
    }
}

#[utoipa::path(
    post,
    path = "/api/books/{id}/reviews",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 201, description = "Review created, book rating recomputed"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "User already reviewed this book"),
        (status = 422, description = "Invalid rating or comment")
    ),
    security(("bearer" = []))
)]
pub async fn create_review(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
    auth: AuthUser,
    Json(payload): Json<ReviewInput>,
) -> impl IntoResponse {
    match state.review_repo.create(auth.id, book_id, payload).await {
        Ok(review) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "Review submitted successfully",
                "data": review,
                "book": book_summary(&state, book_id).await
            })),
        )
            .into_response(),
        Err(e) => error_response(e, "Book not found"),
    }
}

#[utoipa::path(
    get,
    path = "/api/books/{id}/reviews/my-review",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "The caller's review of the book"),
        (status = 404, description = "No review yet")
    ),
    security(("bearer" = []))
)]
pub async fn my_review(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
    auth: AuthUser,
) -> impl IntoResponse {
    match state.review_repo.find_user_review(auth.id, book_id).await {
        Ok(Some(review)) => Json(json!({ "success": true, "data": review })).into_response(),
        Ok(None) => error_response(
            DomainError::NotFound,
            "You haven't reviewed this book yet",
        ),
        Err(e) => error_response(e, ""),
    }
}

#[utoipa::path(
    put,
    path = "/api/books/{id}/reviews/{review_id}",
    params(
        ("id" = i32, Path, description = "Book id"),
        ("review_id" = i32, Path, description = "Review id")
    ),
    responses(
        (status = 200, description = "Review updated, book rating recomputed"),
        (status = 404, description = "Review not found for this user and book"),
        (status = 422, description = "Invalid rating or comment")
    ),
    security(("bearer" = []))
)]
pub async fn update_review(
    State(state): State<AppState>,
    Path((book_id, review_id)): Path<(i32, i32)>,
    auth: AuthUser,
    Json(payload): Json<ReviewInput>,
) -> impl IntoResponse {
    match state
        .review_repo
        .update(auth.id, book_id, review_id, payload)
        .await
    {
        Ok(review) => Json(json!({
            "success": true,
            "message": "Review updated successfully",
            "data": review,
            "book": book_summary(&state, book_id).await
        }))
        .into_response(),
        Err(e) => error_response(e, "Review not found"),
    }
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}/reviews/{review_id}",
    params(
        ("id" = i32, Path, description = "Book id"),
        ("review_id" = i32, Path, description = "Review id")
    ),
    responses(
        (status = 200, description = "Review deleted, book rating recomputed"),
        (status = 404, description = "Review not found for this user and book")
    ),
    security(("bearer" = []))
)]
pub async fn delete_review(
    State(state): State<AppState>,
    Path((book_id, review_id)): Path<(i32, i32)>,
    auth: AuthUser,
) -> impl IntoResponse {
    match state
        .review_repo
        .delete_own(auth.id, book_id, review_id)
        .await
    {
        Ok(()) => Json(json!({
            "success": true,
            "message": "Review deleted successfully",
            "book": book_summary(&state, book_id).await
        }))
        .into_response(),
        Err(e) => error_response(e, "Review not found"),
    }
}

#[utoipa::path(
    get,
    path = "/api/my-reviews",
    responses(
        (status = 200, description = "The caller's reviews with book summaries")
    ),
    security(("bearer" = []))
)]
pub async fn my_reviews(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    match state
        .review_repo
        .find_by_user(auth.id, query.page(), query.per_page())
        .await
    {
        Ok(result) => Json(json!({
            "success": true,
            "data": result.reviews,
            "total": result.total,
            "page": result.page,
            "per_page": result.per_page
        }))
        .into_response(),
        Err(e) => error_response(e, ""),
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/reviews",
    responses(
        (status = 200, description = "All reviews matching the filters"),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearer" = []))
)]
pub async fn admin_list_reviews(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(filter): Query<AdminReviewFilter>,
) -> impl IntoResponse {
    match state.review_repo.find_all(filter).await {
        Ok(reviews) => Json(json!({
            "success": true,
            "total": reviews.len(),
            "data": reviews
        }))
        .into_response(),
        Err(e) => error_response(e, ""),
    }
}

#[utoipa::path(
    delete,
    path = "/api/admin/reviews/{review_id}",
    params(("review_id" = i32, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review deleted, book rating recomputed"),
        (status = 404, description = "Review not found"),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearer" = []))
)]
pub async fn admin_delete_review(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(review_id): Path<i32>,
) -> impl IntoResponse {
    match state.review_repo.delete(review_id).await {
        Ok(()) => {
            tracing::info!("Admin {} deleted review {}", admin.id, review_id);
            Json(json!({ "success": true, "message": "Review deleted successfully" }))
                .into_response()
        }
        Err(e) => error_response(e, "Review not found"),
    }
}
