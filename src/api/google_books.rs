//! Administrator access to the Google Books adapter

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::api::error_response;
use crate::domain::{DomainError, ValidationErrors};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::AdminUser;
use crate::modules::integrations::google_books::{DEFAULT_SEARCH_RESULTS, MAX_SEARCH_RESULTS};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// At least 2 characters
    pub query: Option<String>,
    /// 1..=40, default 10
    pub max_results: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DownloadCoverRequest {
    pub url: Option<String>,
}

fn validate_search(query: &SearchQuery) -> Result<(String, u32), DomainError> {
    let mut errors = ValidationErrors::new();

    let text = query.query.as_deref().unwrap_or_default().trim().to_string();
    if text.is_empty() {
        errors.add("query", "The query field is required.");
    } else if text.chars().count() < 2 {
        errors.add("query", "The query must be at least 2 characters.");
    }

    let max_results = match query.max_results.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_SEARCH_RESULTS,
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if (1..=MAX_SEARCH_RESULTS).contains(&n) => n,
            _ => {
                errors.add(
                    "max_results",
                    format!("The max results must be between 1 and {}.", MAX_SEARCH_RESULTS),
                );
                DEFAULT_SEARCH_RESULTS
            }
        },
    };

    errors.into_result()?;
    Ok((text, max_results))
}

#[utoipa::path(
    get,
    path = "/api/admin/google-books/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Catalog-ready candidates, empty on upstream failure"),
        (status = 422, description = "Invalid query"),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearer" = []))
)]
pub async fn search(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let (text, max_results) = match validate_search(&query) {
        Ok(v) => v,
        Err(e) => return error_response(e, ""),
    };

    let results = state.metadata.search(&text, max_results).await;
    Json(json!({
        "success": true,
        "data": results,
        "total": results.len()
    }))
    .into_response()
}

#[utoipa::path(
    post,
    path = "/api/admin/google-books/download-cover",
    request_body = DownloadCoverRequest,
    responses(
        (status = 200, description = "Cover stored, filename returned"),
        (status = 422, description = "Missing or invalid URL"),
        (status = 500, description = "Download failed"),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearer" = []))
)]
pub async fn download_cover(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<DownloadCoverRequest>,
) -> impl IntoResponse {
    let url = payload.url.unwrap_or_default();
    if url::Url::parse(url.trim()).is_err() {
        let mut errors = ValidationErrors::new();
        errors.add("url", "The url must be a valid URL.");
        return error_response(DomainError::Validation(errors), "");
    }

    match state.metadata.fetch_and_store(url.trim()).await {
        Some(filename) => Json(json!({
            "success": true,
            "url": format!("/storage/{}", filename),
            "filename": filename
        }))
        .into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "message": "Failed to download cover image"
            })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(q: Option<&str>, max: Option<&str>) -> SearchQuery {
        SearchQuery {
            query: q.map(str::to_string),
            max_results: max.map(str::to_string),
        }
    }

    #[test]
    fn search_validation() {
        assert_eq!(
            validate_search(&query(Some("dune"), None)).unwrap(),
            ("dune".to_string(), DEFAULT_SEARCH_RESULTS)
        );
        assert_eq!(
            validate_search(&query(Some("dune"), Some("40"))).unwrap().1,
            40
        );
        assert!(validate_search(&query(Some("d"), None)).is_err());
        assert!(validate_search(&query(None, None)).is_err());
        assert!(validate_search(&query(Some("dune"), Some("41"))).is_err());
        assert!(validate_search(&query(Some("dune"), Some("0"))).is_err());
    }
}
