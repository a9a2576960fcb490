//! SeaORM implementation of FavoriteRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::domain::{
    DomainError, FavoriteFilter, FavoriteRepository, MAX_PER_PAGE, PaginatedBooks, page_index,
};
use crate::models::favorite::{ActiveModel, Column, Entity as FavoriteEntity};
use crate::models::{Book, book};
use crate::utils::now_rfc3339;

pub const DEFAULT_FAVORITES_PER_PAGE: u64 = 12;

/// Requested page size, defaulted and capped
pub fn favorites_per_page(requested: Option<u64>) -> u64 {
    requested
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_FAVORITES_PER_PAGE)
        .min(MAX_PER_PAGE)
}

/// SeaORM-based implementation of FavoriteRepository
pub struct SeaOrmFavoriteRepository {
    db: DatabaseConnection,
}

impl SeaOrmFavoriteRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FavoriteRepository for SeaOrmFavoriteRepository {
    async fn find_by_user(
        &self,
        user_id: i32,
        filter: FavoriteFilter,
    ) -> Result<PaginatedBooks, DomainError> {
        let mut query = book::Entity::find()
            .join(JoinType::InnerJoin, book::Relation::Favorites.def())
            .filter(Column::UserId.eq(user_id));

        if let Some(genre) = &filter.genre
            && !genre.is_empty()
        {
            query = query.filter(book::Column::Genre.eq(genre.as_str()));
        }

        if let Some(search) = &filter.search
            && !search.trim().is_empty()
        {
            let search = search.trim();
            query = query.filter(
                Condition::any()
                    .add(book::Column::Title.contains(search))
                    .add(book::Column::Author.contains(search)),
            );
        }

        let query = query
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        let per_page = favorites_per_page(filter.per_page);
        let paginator = query.paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let books = match page_index(filter.page.unwrap_or(1), per_page, total) {
            Some(index) => paginator.fetch_page(index).await?,
            None => Vec::new(),
        };

        Ok(PaginatedBooks {
            books: books.into_iter().map(Book::from).collect(),
            total,
        })
    }

    async fn toggle(&self, user_id: i32, book_id: i32) -> Result<bool, DomainError> {
        book::Entity::find_by_id(book_id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let existing = FavoriteEntity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::BookId.eq(book_id))
            .one(&self.db)
            .await?;

        if let Some(favorite) = existing {
            favorite.delete(&self.db).await?;
            tracing::debug!("User {} unfavorited book {}", user_id, book_id);
            return Ok(false);
        }

        let now = now_rfc3339();
        let model = ActiveModel {
            user_id: Set(user_id),
            book_id: Set(book_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        match model.insert(&self.db).await.map_err(DomainError::from) {
            Ok(_) => {}
            // A concurrent toggle already added it
            Err(DomainError::Conflict(_)) => {}
            Err(e) => return Err(e),
        }
        tracing::debug!("User {} favorited book {}", user_id, book_id);
        Ok(true)
    }

    async fn is_favorited(&self, user_id: i32, book_id: i32) -> Result<bool, DomainError> {
        let count = FavoriteEntity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::BookId.eq(book_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn remove(&self, user_id: i32, book_id: i32) -> Result<(), DomainError> {
        let result = FavoriteEntity::delete_many()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::BookId.eq(book_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }
}
