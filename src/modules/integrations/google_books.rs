//! Google Books metadata and cover import
//!
//! Both operations fail closed: any transport error, timeout, non-success
//! status or malformed payload is logged and turned into an empty result
//! (`search`) or `None` (`fetch_and_store`).

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::infrastructure::storage;

pub const MAX_SEARCH_RESULTS: u32 = 40;
pub const DEFAULT_SEARCH_RESULTS: u32 = 10;
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_AUTHORS: usize = 3;

/// One catalog-ready search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BookCandidate {
    pub google_id: Option<String>,
    pub title: String,
    /// Up to three authors joined by ", "
    pub author: String,
    pub description: String,
    pub published_year: Option<i32>,
    pub genre: String,
    /// Best available cover, always https
    pub cover_image_url: Option<String>,
    pub thumbnail: Option<String>,
    pub page_count: Option<i32>,
    pub publisher: Option<String>,
    pub language: String,
}

/// Source of book metadata and cover images for catalog entry
#[async_trait]
pub trait BookMetadataSource: Send + Sync {
    /// Up to `max_results` (clamped to 1..=40) candidates for a free-text query.
    async fn search(&self, query: &str, max_results: u32) -> Vec<BookCandidate>;

    /// Download an image and store it, returning its storage-relative filename.
    async fn fetch_and_store(&self, url: &str) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct GoogleBooksResponse {
    items: Option<Vec<GoogleBookItem>>,
}

#[derive(Debug, Deserialize)]
struct GoogleBookItem {
    id: Option<String>,
    #[serde(rename = "volumeInfo", default)]
    volume_info: GoogleVolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleVolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    description: Option<String>,
    published_date: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    image_links: Option<GoogleImageLinks>,
    page_count: Option<i32>,
    publisher: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleImageLinks {
    extra_large: Option<String>,
    large: Option<String>,
    medium: Option<String>,
    small: Option<String>,
    thumbnail: Option<String>,
    small_thumbnail: Option<String>,
}

/// Join at most three authors, or "Unknown Author".
pub fn format_authors(authors: &[String]) -> String {
    if authors.is_empty() {
        return "Unknown Author".to_string();
    }
    authors
        .iter()
        .take(MAX_AUTHORS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// First run of four ASCII digits in a date string ("2004-05-01", "c. 1999").
pub fn extract_year(published_date: &str) -> Option<i32> {
    published_date
        .as_bytes()
        .windows(4)
        .find(|w| w.iter().all(u8::is_ascii_digit))
        .and_then(|w| std::str::from_utf8(w).ok())
        .and_then(|s| s.parse().ok())
}

/// First category, cut at the first "/" ("Fiction / Fantasy" -> "Fiction").
pub fn extract_genre(categories: &[String]) -> String {
    match categories.first() {
        None => "General".to_string(),
        Some(genre) if genre.contains('/') => genre
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string(),
        Some(genre) => genre.clone(),
    }
}

fn secure(url: &str) -> String {
    url.replace("http://", "https://")
}

// Priority: extraLarge > large > medium > small > thumbnail > smallThumbnail
fn best_cover_image(links: &GoogleImageLinks) -> Option<String> {
    [
        &links.extra_large,
        &links.large,
        &links.medium,
        &links.small,
        &links.thumbnail,
        &links.small_thumbnail,
    ]
    .into_iter()
    .find_map(|link| link.as_deref())
    .map(secure)
}

fn to_candidate(item: GoogleBookItem) -> BookCandidate {
    let info = item.volume_info;
    let links = info.image_links.unwrap_or_default();

    BookCandidate {
        google_id: item.id,
        title: info.title.unwrap_or_else(|| "Unknown Title".to_string()),
        author: format_authors(&info.authors),
        description: info.description.unwrap_or_default(),
        published_year: info.published_date.as_deref().and_then(extract_year),
        genre: extract_genre(&info.categories),
        cover_image_url: best_cover_image(&links),
        thumbnail: links.thumbnail.clone(),
        page_count: info.page_count,
        publisher: info.publisher,
        language: info.language.unwrap_or_else(|| "en".to_string()),
    }
}

fn parse_search_response(body: &str) -> Option<Vec<BookCandidate>> {
    let parsed: GoogleBooksResponse = serde_json::from_str(body).ok()?;
    Some(
        parsed
            .items
            .unwrap_or_default()
            .into_iter()
            .map(to_candidate)
            .collect(),
    )
}

/// File extension of the URL path, `jpg` when there is none.
fn extension_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            std::path::Path::new(u.path())
                .extension()
                .and_then(|e| e.to_str())
                .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
                .map(str::to_lowercase)
        })
        .unwrap_or_else(|| "jpg".to_string())
}

/// `BookMetadataSource` backed by the Google Books volumes API
pub struct GoogleBooksClient {
    client: reqwest::Client,
    api_url: String,
    storage_dir: PathBuf,
}

impl GoogleBooksClient {
    pub fn new(api_url: impl Into<String>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            storage_dir: storage_dir.into(),
        }
    }
}

#[async_trait]
impl BookMetadataSource for GoogleBooksClient {
    async fn search(&self, query: &str, max_results: u32) -> Vec<BookCandidate> {
        let max_results = max_results.clamp(1, MAX_SEARCH_RESULTS);
        let max_results_param = max_results.to_string();

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("q", query),
                ("maxResults", max_results_param.as_str()),
                ("printType", "books"),
                ("langRestrict", "en"),
            ])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Google Books API request failed: {}", e);
                return Vec::new();
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                tracing::error!("Google Books API body read failed: {}", e);
                return Vec::new();
            }
        };

        if !status.is_success() {
            tracing::error!("Google Books API error: status={} body={}", status, body);
            return Vec::new();
        }

        match parse_search_response(&body) {
            Some(mut candidates) => {
                candidates.truncate(max_results as usize);
                tracing::info!(
                    "Google Books search {:?} returned {} candidates",
                    query,
                    candidates.len()
                );
                candidates
            }
            None => {
                tracing::error!("Google Books API returned a malformed payload");
                Vec::new()
            }
        }
    }

    async fn fetch_and_store(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).timeout(DOWNLOAD_TIMEOUT).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::error!(
                    "Failed to download cover image {}: status {}",
                    url,
                    r.status()
                );
                return None;
            }
            Err(e) => {
                tracing::error!("Error downloading cover image {}: {}", url, e);
                return None;
            }
        };

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                tracing::error!("Error reading cover image {}: {}", url, e);
                return None;
            }
        };

        let stem = format!("google_book_{}", uuid::Uuid::new_v4().simple());
        match storage::store_cover(&self.storage_dir, &stem, &extension_of(url), &bytes).await {
            Ok(filename) => {
                tracing::info!("Stored cover image {} ({} bytes)", filename, bytes.len());
                Some(filename)
            }
            Err(e) => {
                tracing::error!("Error storing cover image {}: {}", url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn authors_are_capped_at_three() {
        assert_eq!(format_authors(&[]), "Unknown Author");
        assert_eq!(format_authors(&strings(&["A"])), "A");
        assert_eq!(
            format_authors(&strings(&["A", "B", "C", "D"])),
            "A, B, C"
        );
    }

    #[test]
    fn year_is_first_four_digit_run() {
        assert_eq!(extract_year("2004-05-01"), Some(2004));
        assert_eq!(extract_year("1999"), Some(1999));
        assert_eq!(extract_year("circa 1850s"), Some(1850));
        assert_eq!(extract_year("May 12"), None);
        assert_eq!(extract_year(""), None);
    }

    #[test]
    fn genre_takes_text_before_slash() {
        assert_eq!(extract_genre(&[]), "General");
        assert_eq!(extract_genre(&strings(&["Fiction / Fantasy / Epic"])), "Fiction");
        assert_eq!(extract_genre(&strings(&["Poetry", "Drama"])), "Poetry");
    }

    #[test]
    fn cover_priority_and_https_rewrite() {
        let links = GoogleImageLinks {
            small: Some("http://books.google.com/small".to_string()),
            thumbnail: Some("http://books.google.com/thumb".to_string()),
            ..Default::default()
        };
        assert_eq!(
            best_cover_image(&links).as_deref(),
            Some("https://books.google.com/small")
        );

        let links = GoogleImageLinks {
            extra_large: Some("https://books.google.com/xl".to_string()),
            large: Some("http://books.google.com/l".to_string()),
            ..Default::default()
        };
        assert_eq!(
            best_cover_image(&links).as_deref(),
            Some("https://books.google.com/xl")
        );

        assert_eq!(best_cover_image(&GoogleImageLinks::default()), None);
    }

    #[test]
    fn parses_volume_payload_with_defaults() {
        let body = r#"{
            "items": [
                {
                    "id": "abc123",
                    "volumeInfo": {
                        "title": "The Hobbit",
                        "authors": ["J.R.R. Tolkien"],
                        "publishedDate": "1937-09-21",
                        "categories": ["Juvenile Fiction / Fantasy & Magic"],
                        "imageLinks": { "thumbnail": "http://books.google.com/t.jpg" },
                        "pageCount": 310
                    }
                },
                { "id": "empty" }
            ]
        }"#;

        let candidates = parse_search_response(body).unwrap();
        assert_eq!(candidates.len(), 2);

        let hobbit = &candidates[0];
        assert_eq!(hobbit.title, "The Hobbit");
        assert_eq!(hobbit.published_year, Some(1937));
        assert_eq!(hobbit.genre, "Juvenile Fiction");
        assert_eq!(
            hobbit.cover_image_url.as_deref(),
            Some("https://books.google.com/t.jpg")
        );
        assert_eq!(hobbit.thumbnail.as_deref(), Some("http://books.google.com/t.jpg"));
        assert_eq!(hobbit.language, "en");

        let empty = &candidates[1];
        assert_eq!(empty.title, "Unknown Title");
        assert_eq!(empty.author, "Unknown Author");
        assert_eq!(empty.genre, "General");
        assert_eq!(empty.cover_image_url, None);

        assert_eq!(parse_search_response("{}").unwrap().len(), 0);
        assert!(parse_search_response("not json").is_none());
    }

    #[test]
    fn extension_falls_back_to_jpg() {
        assert_eq!(extension_of("https://x.test/covers/a.PNG"), "png");
        assert_eq!(
            extension_of("https://books.google.com/books/content?id=1&zoom=1"),
            "jpg"
        );
        assert_eq!(extension_of("not a url"), "jpg");
    }
}
