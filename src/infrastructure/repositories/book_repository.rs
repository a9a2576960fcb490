//! SeaORM implementation of BookRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

use crate::domain::{
    BookChanges, BookFilter, BookRepository, DomainError, MAX_PER_PAGE, NewBook, PaginatedBooks,
    SortKey, page_index,
};
use crate::infrastructure::state::BookLocks;
use crate::models::book::{ActiveModel, Column, Entity as BookEntity};
use crate::models::{Book, favorite, review};
use crate::utils::now_rfc3339;

/// SeaORM-based implementation of BookRepository
pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
    locks: BookLocks,
}

impl SeaOrmBookRepository {
    pub fn new(db: DatabaseConnection, locks: BookLocks) -> Self {
        Self { db, locks }
    }

    async fn exists_by_id(&self, id: i32) -> Result<bool, DomainError> {
        Ok(BookEntity::find_by_id(id).count(&self.db).await? > 0)
    }
}

/// Apply the listing filters shared by the catalog and other book queries
pub(crate) fn apply_filter(
    mut query: Select<BookEntity>,
    filter: &BookFilter,
) -> Select<BookEntity> {
    if let Some(search) = &filter.search
        && !search.trim().is_empty()
    {
        let search = search.trim();
        query = query.filter(
            Condition::any()
                .add(Column::Title.contains(search))
                .add(Column::Author.contains(search)),
        );
    }

    if let Some(genre) = &filter.genre
        && !genre.is_empty()
    {
        query = query.filter(Column::Genre.eq(genre.as_str()));
    }

    if let Some(min_rating) = filter.min_rating {
        query = query.filter(Column::Rating.gte(min_rating));
    }

    if let Some(year) = filter.year {
        query = query.filter(Column::PublicationYear.eq(year));
    }

    query
}

/// Order by the sort key, ties broken by descending id
pub(crate) fn apply_sort(query: Select<BookEntity>, sort: SortKey) -> Select<BookEntity> {
    let query = match sort {
        SortKey::Newest => query.order_by_desc(Column::CreatedAt),
        SortKey::Oldest => query.order_by_asc(Column::CreatedAt),
        SortKey::TitleAsc => query.order_by_asc(Column::Title),
        SortKey::TitleDesc => query.order_by_desc(Column::Title),
        SortKey::RatingHigh => query.order_by_desc(Column::Rating),
        SortKey::RatingLow => query.order_by_asc(Column::Rating),
        SortKey::Popular => query.order_by_desc(Column::ReviewCount),
    };
    query.order_by_desc(Column::Id)
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn find_all(&self, filter: BookFilter) -> Result<PaginatedBooks, DomainError> {
        let query = apply_sort(apply_filter(BookEntity::find(), &filter), filter.sort);

        // Fetch with pagination and total count
        let (books, total) = match filter.per_page {
            Some(per_page) if per_page > 0 => {
                let per_page = per_page.min(MAX_PER_PAGE);
                let paginator = query.paginate(&self.db, per_page);
                let total = paginator.num_items().await?;
                let items = match page_index(filter.page.unwrap_or(1), per_page, total) {
                    Some(index) => paginator.fetch_page(index).await?,
                    None => Vec::new(),
                };
                (items, total)
            }
            _ => {
                let items = query.all(&self.db).await?;
                let total = items.len() as u64;
                (items, total)
            }
        };

        Ok(PaginatedBooks {
            books: books.into_iter().map(Book::from).collect(),
            total,
        })
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError> {
        let book = BookEntity::find_by_id(id).one(&self.db).await?;
        Ok(book.map(Book::from))
    }

    async fn genres(&self) -> Result<Vec<String>, DomainError> {
        let genres: Vec<String> = BookEntity::find()
            .select_only()
            .column(Column::Genre)
            .distinct()
            .order_by_asc(Column::Genre)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(genres)
    }

    async fn exists(&self, title: &str, author: &str) -> Result<bool, DomainError> {
        let count = BookEntity::find()
            .filter(Column::Title.eq(title))
            .filter(Column::Author.eq(author))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn create(&self, book: NewBook) -> Result<Book, DomainError> {
        let now = now_rfc3339();

        let model = ActiveModel {
            title: Set(book.title),
            author: Set(book.author),
            publication_year: Set(book.publication_year),
            genre: Set(book.genre),
            description: Set(book.description),
            rating: Set(0.0),
            review_count: Set(0),
            cover_image: Set(book.cover_image),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await?;
        tracing::info!("Created book {} ({:?})", result.id, result.title);

        Ok(Book::from(result))
    }

    async fn update(&self, id: i32, changes: BookChanges) -> Result<Book, DomainError> {
        let existing = BookEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut model: ActiveModel = existing.into();

        if let Some(title) = changes.title {
            model.title = Set(title);
        }
        if let Some(author) = changes.author {
            model.author = Set(author);
        }
        if let Some(year) = changes.publication_year {
            model.publication_year = Set(year);
        }
        if let Some(genre) = changes.genre {
            model.genre = Set(genre);
        }
        if let Some(description) = changes.description {
            model.description = Set(description);
        }
        if let Some(cover) = changes.cover_image {
            model.cover_image = Set(Some(cover));
        }
        model.updated_at = Set(now_rfc3339());

        let result = model.update(&self.db).await?;
        Ok(Book::from(result))
    }

    async fn delete(&self, id: i32) -> Result<Book, DomainError> {
        if !self.exists_by_id(id).await? {
            return Err(DomainError::NotFound);
        }

        // Review writers for this book must not interleave with the delete
        let existing = self
            .locks
            .run(id, async {
                let txn = self.db.begin().await?;

                let existing = BookEntity::find_by_id(id)
                    .one(&txn)
                    .await?
                    .ok_or(DomainError::NotFound)?;

                let reviews = review::Entity::delete_many()
                    .filter(review::Column::BookId.eq(id))
                    .exec(&txn)
                    .await?;
                let favorites = favorite::Entity::delete_many()
                    .filter(favorite::Column::BookId.eq(id))
                    .exec(&txn)
                    .await?;
                BookEntity::delete_by_id(id).exec(&txn).await?;

                txn.commit().await?;

                tracing::info!(
                    "Deleted book {} with {} reviews and {} favorites",
                    id,
                    reviews.rows_affected,
                    favorites.rows_affected
                );
                Ok(existing)
            })
            .await?;
        self.locks.forget(id);

        Ok(Book::from(existing))
    }
}
