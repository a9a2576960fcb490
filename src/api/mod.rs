pub mod admin;
pub mod auth;
pub mod books;
pub mod favorites;
pub mod google_books;
pub mod health;
pub mod reviews;
pub mod stats;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde_json::json;

use crate::domain::DomainError;
use crate::infrastructure::AppState;

/// Map a domain error to its HTTP response. `not_found` is the message used
/// for `DomainError::NotFound`.
pub fn error_response(err: DomainError, not_found: &str) -> Response {
    match err {
        DomainError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": not_found })),
        )
            .into_response(),
        DomainError::Conflict(message) => (
            StatusCode::CONFLICT,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response(),
        DomainError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "success": false,
                "message": "The given data was invalid.",
                "errors": errors
            })),
        )
            .into_response(),
        DomainError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Unauthorized. Please login first." })),
        )
            .into_response(),
        DomainError::Forbidden => (
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "message": "Forbidden." })),
        )
            .into_response(),
        e => {
            tracing::error!("Request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Internal server error" })),
            )
                .into_response()
        }
    }
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/stats", get(stats::public_stats))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Catalog
        .route("/books", get(books::list_books))
        .route("/books/genres", get(books::list_genres))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id/recommendations", get(books::recommendations))
        // Reviews
        .route(
            "/books/:id/reviews",
            get(reviews::list_book_reviews).post(reviews::create_review),
        )
        .route("/books/:id/reviews/my-review", get(reviews::my_review))
        .route(
            "/books/:id/reviews/:review_id",
            put(reviews::update_review).delete(reviews::delete_review),
        )
        .route("/my-reviews", get(reviews::my_reviews))
        // Favorites
        .route("/favorites", get(favorites::list_favorites))
        .route("/favorites/statistics", get(favorites::statistics))
        .route("/favorites/:book_id", delete(favorites::remove_favorite))
        .route("/favorites/:book_id/toggle", post(favorites::toggle_favorite))
        .route("/favorites/:book_id/check", get(favorites::check_favorite))
        // Administration
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/books", post(admin::create_book))
        .route("/admin/books/statistics", get(admin::book_statistics))
        .route(
            "/admin/books/:id",
            put(admin::update_book).delete(admin::delete_book),
        )
        .route("/admin/reviews", get(reviews::admin_list_reviews))
        .route(
            "/admin/reviews/:review_id",
            delete(reviews::admin_delete_review),
        )
        .route(
            "/admin/favorites/statistics",
            get(favorites::admin_statistics),
        )
        .route("/admin/google-books/search", get(google_books::search))
        .route(
            "/admin/google-books/download-cover",
            post(google_books::download_cover),
        )
        .with_state(state)
}
