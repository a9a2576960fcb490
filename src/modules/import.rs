//! Bulk catalog import from a metadata source

use std::time::Duration;

use chrono::Datelike;
use serde::Serialize;

use crate::domain::{BookRepository, DomainError, NewBook};
use crate::modules::integrations::google_books::{BookCandidate, BookMetadataSource};

/// Queries used when no explicit query is given
pub const DEFAULT_QUERIES: [&str; 25] = [
    "bestseller fiction",
    "classic literature",
    "science fiction",
    "fantasy novels",
    "mystery thriller",
    "romance novels",
    "biography",
    "history books",
    "self help",
    "business books",
    "technology programming",
    "philosophy",
    "psychology",
    "young adult",
    "children books",
    "horror books",
    "adventure novels",
    "poetry",
    "drama plays",
    "crime novels",
    "political books",
    "art books",
    "cooking books",
    "travel books",
    "sports books",
];

const NO_DESCRIPTION: &str = "No description available.";

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Stop after this many books were created
    pub count: usize,
    /// Single query replacing `DEFAULT_QUERIES`
    pub query: Option<String>,
    pub per_query: u32,
    /// Pause between two queries to stay under API rate limits
    pub pause: Duration,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            count: 50,
            query: None,
            per_query: 15,
            pause: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

impl ImportReport {
    pub fn processed(&self) -> usize {
        self.imported + self.skipped
    }
}

fn to_new_book(candidate: BookCandidate, cover_image: String) -> NewBook {
    let description = if candidate.description.trim().is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        candidate.description
    };

    NewBook {
        title: candidate.title,
        author: candidate.author,
        publication_year: candidate
            .published_year
            .unwrap_or_else(|| chrono::Utc::now().year()),
        genre: candidate.genre,
        description,
        cover_image: Some(cover_image),
    }
}

/// Import books until `options.count` were created or the queries run out.
///
/// Candidates without a cover, already present by (title, author), or whose
/// cover download fails are skipped. A failed insert is logged and skipped;
/// only a failed duplicate lookup aborts the run.
pub async fn import_books(
    books: &dyn BookRepository,
    source: &dyn BookMetadataSource,
    options: &ImportOptions,
) -> Result<ImportReport, DomainError> {
    let queries: Vec<String> = match &options.query {
        Some(q) if !q.trim().is_empty() => vec![q.trim().to_string()],
        _ => DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
    };

    let mut report = ImportReport::default();

    for (i, query) in queries.iter().enumerate() {
        if report.imported >= options.count {
            break;
        }
        if i > 0 && !options.pause.is_zero() {
            tokio::time::sleep(options.pause).await;
        }

        let candidates = source.search(query, options.per_query).await;
        tracing::info!("Import query {:?}: {} candidates", query, candidates.len());

        for candidate in candidates {
            if report.imported >= options.count {
                break;
            }

            let Some(cover_url) = candidate.cover_image_url.clone() else {
                report.skipped += 1;
                continue;
            };

            if books.exists(&candidate.title, &candidate.author).await? {
                tracing::debug!("Skipping existing book {:?}", candidate.title);
                report.skipped += 1;
                continue;
            }

            let Some(cover_image) = source.fetch_and_store(&cover_url).await else {
                report.skipped += 1;
                continue;
            };

            let title = candidate.title.clone();
            match books.create(to_new_book(candidate, cover_image)).await {
                Ok(_) => report.imported += 1,
                Err(e) => {
                    tracing::error!("Failed to import {:?}: {}", title, e);
                    report.skipped += 1;
                }
            }
        }
    }

    tracing::info!(
        "Import finished: {} imported, {} skipped",
        report.imported,
        report.skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db;
    use crate::infrastructure::repositories::SeaOrmBookRepository;
    use crate::infrastructure::state::BookLocks;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeSource {
        results: Vec<BookCandidate>,
        failing_cover: Option<String>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BookMetadataSource for FakeSource {
        async fn search(&self, query: &str, _max_results: u32) -> Vec<BookCandidate> {
            self.queries.lock().unwrap().push(query.to_string());
            // Titles differ per query, as real searches would
            self.results
                .iter()
                .cloned()
                .map(|mut c| {
                    c.title = format!("{} ({})", c.title, query);
                    c
                })
                .collect()
        }

        async fn fetch_and_store(&self, url: &str) -> Option<String> {
            if self.failing_cover.as_deref() == Some(url) {
                return None;
            }
            Some(format!("covers/google_book_{}.jpg", url.len()))
        }
    }

    fn candidate(title: &str, cover: Option<&str>) -> BookCandidate {
        BookCandidate {
            google_id: None,
            title: title.to_string(),
            author: "Someone".to_string(),
            description: String::new(),
            published_year: None,
            genre: "General".to_string(),
            cover_image_url: cover.map(str::to_string),
            thumbnail: None,
            page_count: None,
            publisher: None,
            language: "en".to_string(),
        }
    }

    #[tokio::test]
    async fn applies_skip_rules() {
        let conn = db::init_db("sqlite::memory:").await.unwrap();
        let repo = SeaOrmBookRepository::new(conn, BookLocks::new());

        let source = FakeSource {
            results: vec![
                candidate("Has Cover", Some("https://x.test/a.jpg")),
                candidate("No Cover", None),
                candidate("Broken Cover", Some("https://x.test/broken.jpg")),
                // Same (title, author) as the first one
                candidate("Has Cover", Some("https://x.test/a.jpg")),
            ],
            failing_cover: Some("https://x.test/broken.jpg".to_string()),
            queries: Mutex::new(Vec::new()),
        };

        let options = ImportOptions {
            query: Some("dune".to_string()),
            pause: Duration::ZERO,
            ..Default::default()
        };

        let report = import_books(&repo, &source, &options).await.unwrap();
        assert_eq!(report, ImportReport { imported: 1, skipped: 3 });
        assert_eq!(*source.queries.lock().unwrap(), vec!["dune".to_string()]);

        let book = repo
            .find_all(Default::default())
            .await
            .unwrap()
            .books
            .remove(0);
        assert_eq!(book.description, NO_DESCRIPTION);
        assert_eq!(book.publication_year, chrono::Utc::now().year());
        assert_eq!(book.rating, 0.0);
        assert_eq!(book.review_count, 0);
        assert!(book.cover_image.is_some());
    }

    #[tokio::test]
    async fn stops_at_count() {
        let conn = db::init_db("sqlite::memory:").await.unwrap();
        let repo = SeaOrmBookRepository::new(conn, BookLocks::new());

        let source = FakeSource {
            results: (0..5)
                .map(|i| candidate(&format!("Book {}", i), Some("https://x.test/c.jpg")))
                .collect(),
            failing_cover: None,
            queries: Mutex::new(Vec::new()),
        };

        let options = ImportOptions {
            count: 7,
            pause: Duration::ZERO,
            ..Default::default()
        };

        let report = import_books(&repo, &source, &options).await.unwrap();
        assert_eq!(report.imported, 7);
        // First query yields 5 books, the second stops after 2
        assert_eq!(source.queries.lock().unwrap().len(), 2);
        assert_eq!(report.skipped, 0);
    }
}
