//! Administrator catalog management and analytics

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::api::error_response;
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::AdminUser;
use crate::infrastructure::storage;
use crate::models::BookInput;
use crate::services::analytics_service;
use crate::services::validation;

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Dashboard figures", body = analytics_service::Dashboard),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearer" = []))
)]
pub async fn dashboard(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> impl IntoResponse {
    match analytics_service::dashboard(state.db()).await {
        Ok(data) => Json(json!({ "success": true, "data": data })).into_response(),
        Err(e) => error_response(e, ""),
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/books/statistics",
    responses(
        (status = 200, description = "Statistics", body = analytics_service::BookStatistics),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearer" = []))
)]
pub async fn book_statistics(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> impl IntoResponse {
    match analytics_service::book_statistics(state.db()).await {
        Ok(data) => Json(json!({ "success": true, "data": data })).into_response(),
        Err(e) => error_response(e, ""),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/books",
    request_body = BookInput,
    responses(
        (status = 201, description = "Book created with rating 0.00 and no reviews"),
        (status = 422, description = "Invalid book fields"),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearer" = []))
)]
pub async fn create_book(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<BookInput>,
) -> impl IntoResponse {
    let new_book = match validation::validate_new_book(payload) {
        Ok(b) => b,
        Err(e) => return error_response(e, ""),
    };

    match state.book_repo.create(new_book).await {
        Ok(book) => {
            tracing::info!("Admin {} created book {}", admin.id, book.id);
            (
                StatusCode::CREATED,
                Json(json!({
                    "success": true,
                    "message": "Book created successfully",
                    "data": book
                })),
            )
                .into_response()
        }
        Err(e) => error_response(e, ""),
    }
}

#[utoipa::path(
    put,
    path = "/api/admin/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book updated"),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Invalid book fields"),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearer" = []))
)]
pub async fn update_book(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i32>,
    Json(payload): Json<BookInput>,
) -> impl IntoResponse {
    let changes = match validation::validate_book_changes(payload) {
        Ok(c) => c,
        Err(e) => return error_response(e, ""),
    };

    let previous_cover = match state.book_repo.find_by_id(id).await {
        Ok(Some(book)) => book.cover_image,
        Ok(None) => return error_response(DomainError::NotFound, "Book not found"),
        Err(e) => return error_response(e, ""),
    };

    match state.book_repo.update(id, changes).await {
        Ok(book) => {
            if let Some(old) = previous_cover
                && book.cover_image.as_deref() != Some(old.as_str())
            {
                storage::remove_cover(&state.config.storage_dir, &old).await;
            }
            tracing::info!("Admin {} updated book {}", admin.id, id);
            Json(json!({
                "success": true,
                "message": "Book updated successfully",
                "data": book
            }))
            .into_response()
        }
        Err(e) => error_response(e, "Book not found"),
    }
}

#[utoipa::path(
    delete,
    path = "/api/admin/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book and its reviews and favorites deleted"),
        (status = 404, description = "Book not found"),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearer" = []))
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match state.book_repo.delete(id).await {
        Ok(book) => {
            if let Some(cover) = &book.cover_image {
                storage::remove_cover(&state.config.storage_dir, cover).await;
            }
            tracing::info!("Admin {} deleted book {}", admin.id, id);
            Json(json!({
                "success": true,
                "message": "Book deleted successfully"
            }))
            .into_response()
        }
        Err(e) => error_response(e, "Book not found"),
    }
}
