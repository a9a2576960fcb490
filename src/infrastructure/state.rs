//! Application state containing repositories and shared resources

use dashmap::DashMap;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{BookRepository, DomainError, FavoriteRepository, ReviewRepository};
use crate::infrastructure::config::Config;
use crate::infrastructure::{
    SeaOrmBookRepository, SeaOrmFavoriteRepository, SeaOrmReviewRepository,
};
use crate::modules::integrations::google_books::{BookMetadataSource, GoogleBooksClient};

/// Registry of per-book locks.
///
/// Review writes for one book and the rating recompute that follows them run
/// while holding that book's lock, so two concurrent mutations cannot both
/// read a stale review set. Different books never contend.
#[derive(Clone, Default)]
pub struct BookLocks {
    inner: Arc<DashMap<i32, Arc<Mutex<()>>>>,
}

impl BookLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, book_id: i32) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the shard guard is released before awaiting
        let mutex = self
            .inner
            .entry(book_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Run `op` while holding the book's lock. A `NotFound` outcome drops
    /// the entry again once the lock is released.
    pub async fn run<T, F>(&self, book_id: i32, op: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        let guard = self.lock(book_id).await;
        let result = op.await;
        drop(guard);

        if matches!(result, Err(DomainError::NotFound)) {
            self.forget(book_id);
        }
        result
    }

    /// Drop the lock entry of a deleted or missing book. Entries still
    /// held or awaited by another task are kept.
    pub fn forget(&self, book_id: i32) {
        self.inner
            .remove_if(&book_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }

    /// Number of books with a lock entry
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    pub config: Arc<Config>,
    pub book_repo: Arc<dyn BookRepository>,
    pub review_repo: Arc<dyn ReviewRepository>,
    pub favorite_repo: Arc<dyn FavoriteRepository>,
    /// Google Books adapter, replaceable in tests
    pub metadata: Arc<dyn BookMetadataSource>,
    pub locks: BookLocks,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let metadata = Arc::new(GoogleBooksClient::new(
            config.google_books_api_url.clone(),
            config.storage_dir.clone(),
        ));
        Self::with_metadata_source(db, config, metadata)
    }

    pub fn with_metadata_source(
        db: DatabaseConnection,
        config: Config,
        metadata: Arc<dyn BookMetadataSource>,
    ) -> Self {
        let locks = BookLocks::new();
        let book_repo = Arc::new(SeaOrmBookRepository::new(db.clone(), locks.clone()));
        let review_repo = Arc::new(SeaOrmReviewRepository::new(db.clone(), locks.clone()));
        let favorite_repo = Arc::new(SeaOrmFavoriteRepository::new(db.clone()));

        Self {
            db,
            config: Arc::new(config),
            book_repo,
            review_repo,
            favorite_repo,
            metadata,
            locks,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Implement FromRef to allow extracting DatabaseConnection from AppState
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
