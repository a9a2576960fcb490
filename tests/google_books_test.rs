use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bookify::google_books::{BookMetadataSource, GoogleBooksClient};

fn volumes_payload() -> serde_json::Value {
    json!({
        "totalItems": 2,
        "items": [
            {
                "id": "vol-1",
                "volumeInfo": {
                    "title": "The Rust Programming Language",
                    "authors": ["Steve Klabnik", "Carol Nichols"],
                    "publishedDate": "2018-08-06",
                    "description": "The official book.",
                    "categories": ["Computers / Programming Languages"],
                    "pageCount": 560,
                    "publisher": "No Starch Press",
                    "language": "en",
                    "imageLinks": {
                        "thumbnail": "http://books.example/thumb.jpg",
                        "large": "http://books.example/large.jpg"
                    }
                }
            },
            {
                "id": "vol-2",
                "volumeInfo": {
                    "title": "Untitled Draft"
                }
            }
        ]
    })
}

#[tokio::test]
async fn test_search_maps_volumes_to_candidates() {
    let mock_server = MockServer::start().await;
    let storage = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/volumes"))
        .and(query_param("q", "rust"))
        .and(query_param("maxResults", "5"))
        .and(query_param("printType", "books"))
        .and(query_param("langRestrict", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volumes_payload()))
        .mount(&mock_server)
        .await;

    let client = GoogleBooksClient::new(format!("{}/volumes", mock_server.uri()), storage.path());
    let results = client.search("rust", 5).await;

    assert_eq!(results.len(), 2);

    let first = &results[0];
    assert_eq!(first.google_id.as_deref(), Some("vol-1"));
    assert_eq!(first.author, "Steve Klabnik, Carol Nichols");
    assert_eq!(first.published_year, Some(2018));
    assert_eq!(first.genre, "Computers");
    assert_eq!(
        first.cover_image_url.as_deref(),
        Some("https://books.example/large.jpg")
    );
    assert_eq!(first.page_count, Some(560));

    let second = &results[1];
    assert_eq!(second.author, "Unknown Author");
    assert_eq!(second.genre, "General");
    assert_eq!(second.cover_image_url, None);
}

#[tokio::test]
async fn test_search_clamps_max_results() {
    let mock_server = MockServer::start().await;
    let storage = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/volumes"))
        .and(query_param("maxResults", "40"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalItems": 0 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GoogleBooksClient::new(format!("{}/volumes", mock_server.uri()), storage.path());
    let results = client.search("anything", 500).await;

    assert!(results.is_empty());
}

#[tokio::test]
async fn test_search_failures_yield_empty_results() {
    let mock_server = MockServer::start().await;
    let storage = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let broken = GoogleBooksClient::new(format!("{}/broken", mock_server.uri()), storage.path());
    assert!(broken.search("rust", 10).await.is_empty());

    let garbled = GoogleBooksClient::new(format!("{}/garbled", mock_server.uri()), storage.path());
    assert!(garbled.search("rust", 10).await.is_empty());
}

#[tokio::test]
async fn test_fetch_and_store_writes_cover() {
    let mock_server = MockServer::start().await;
    let storage = tempfile::tempdir().unwrap();
    let image = vec![0x89, b'P', b'N', b'G', 1, 2, 3];

    Mock::given(method("GET"))
        .and(path("/img/cover.PNG"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image.clone()))
        .mount(&mock_server)
        .await;

    let client = GoogleBooksClient::new(mock_server.uri(), storage.path());
    let filename = client
        .fetch_and_store(&format!("{}/img/cover.PNG", mock_server.uri()))
        .await
        .expect("cover should be stored");

    assert!(filename.starts_with("covers/google_book_"));
    assert!(filename.ends_with(".png"));

    let stored = std::fs::read(storage.path().join(&filename)).unwrap();
    assert_eq!(stored, image);
}

#[tokio::test]
async fn test_fetch_and_store_defaults_extension() {
    let mock_server = MockServer::start().await;
    let storage = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/books/content"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .mount(&mock_server)
        .await;

    let client = GoogleBooksClient::new(mock_server.uri(), storage.path());
    let filename = client
        .fetch_and_store(&format!("{}/books/content?id=abc&zoom=1", mock_server.uri()))
        .await
        .expect("cover should be stored");

    assert!(filename.ends_with(".jpg"));
}

#[tokio::test]
async fn test_fetch_and_store_missing_image() {
    let mock_server = MockServer::start().await;
    let storage = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = GoogleBooksClient::new(mock_server.uri(), storage.path());
    let result = client
        .fetch_and_store(&format!("{}/missing.jpg", mock_server.uri()))
        .await;

    assert_eq!(result, None);
    assert!(!storage.path().join("covers").exists());
}
