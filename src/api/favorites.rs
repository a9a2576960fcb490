use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::api::error_response;
use crate::domain::FavoriteFilter;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::{AdminUser, AuthUser};
use crate::infrastructure::repositories::favorite_repository::favorites_per_page;
use crate::services::analytics_service;

#[utoipa::path(
    get,
    path = "/api/favorites",
    responses(
        (status = 200, description = "The caller's favorite books, newest favorite first")
    ),
    security(("bearer" = []))
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<FavoriteFilter>,
) -> impl IntoResponse {
    let page = filter.page.unwrap_or(1).max(1);
    let per_page = favorites_per_page(filter.per_page);

    match state.favorite_repo.find_by_user(auth.id, filter).await {
        Ok(result) => Json(json!({
            "success": true,
            "data": result.books,
            "total": result.total,
            "page": page,
            "per_page": per_page
        }))
        .into_response(),
        Err(e) => error_response(e, ""),
    }
}

#[utoipa::path(
    post,
    path = "/api/favorites/{book_id}/toggle",
    params(("book_id" = i32, Path, description = "Book id")),
    responses(
        (status = 201, description = "Book added to favorites"),
        (status = 200, description = "Book removed from favorites"),
        (status = 404, description = "Book not found")
    ),
    security(("bearer" = []))
)]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
    auth: AuthUser,
) -> impl IntoResponse {
    match state.favorite_repo.toggle(auth.id, book_id).await {
        Ok(true) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "Book added to favorites",
                "is_favorited": true
            })),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Book removed from favorites",
                "is_favorited": false
            })),
        )
            .into_response(),
        Err(e) => error_response(e, "Book not found"),
    }
}

#[utoipa::path(
    get,
    path = "/api/favorites/{book_id}/check",
    params(("book_id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Whether the caller favorited the book")
    ),
    security(("bearer" = []))
)]
pub async fn check_favorite(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
    auth: AuthUser,
) -> impl IntoResponse {
    match state.favorite_repo.is_favorited(auth.id, book_id).await {
        Ok(is_favorited) => Json(json!({
            "success": true,
            "is_favorited": is_favorited
        }))
        .into_response(),
        Err(e) => error_response(e, ""),
    }
}

#[utoipa::path(
    delete,
    path = "/api/favorites/{book_id}",
    params(("book_id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Removed from favorites"),
        (status = 404, description = "Book is not a favorite")
    ),
    security(("bearer" = []))
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
    auth: AuthUser,
) -> impl IntoResponse {
    match state.favorite_repo.remove(auth.id, book_id).await {
        Ok(()) => Json(json!({
            "success": true,
            "message": "Book removed from favorites"
        }))
        .into_response(),
        Err(e) => error_response(e, "Book is not in your favorites"),
    }
}

#[utoipa::path(
    get,
    path = "/api/favorites/statistics",
    responses(
        (
            status = 200,
            description = "Breakdown of the caller's favorites",
            body = analytics_service::UserFavoriteStatistics
        )
    ),
    security(("bearer" = []))
)]
pub async fn statistics(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    match analytics_service::user_favorite_statistics(state.db(), auth.id).await {
        Ok(stats) => Json(json!({ "success": true, "data": stats })).into_response(),
        Err(e) => error_response(e, ""),
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/favorites/statistics",
    responses(
        (
            status = 200,
            description = "Catalog-wide favorite statistics",
            body = analytics_service::AdminFavoriteStatistics
        ),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearer" = []))
)]
pub async fn admin_statistics(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> impl IntoResponse {
    match analytics_service::admin_favorite_statistics(state.db()).await {
        Ok(stats) => Json(json!({ "success": true, "data": stats })).into_response(),
        Err(e) => error_response(e, ""),
    }
}
