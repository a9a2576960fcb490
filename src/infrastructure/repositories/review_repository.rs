//! SeaORM implementation of ReviewRepository
//!
//! Every mutation follows the same sequence: take the book's lock, open a
//! transaction, write the review, recompute the book's rating inside that
//! transaction, commit. A failure at any step rolls the whole mutation back.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

use crate::domain::{
    AdminReviewFilter, DomainError, MAX_PER_PAGE, PaginatedReviews, ReviewInput,
    ReviewRepository, page_index,
};
use crate::infrastructure::state::BookLocks;
use crate::models::review::{ActiveModel, Column, Entity as ReviewEntity};
use crate::models::{Review, book, review, user};
use crate::services::{rating_service, validation};
use crate::utils::now_rfc3339;

pub const DUPLICATE_REVIEW_MESSAGE: &str =
    "You have already reviewed this book. Please update your existing review.";

/// SeaORM-based implementation of ReviewRepository
pub struct SeaOrmReviewRepository {
    db: DatabaseConnection,
    locks: BookLocks,
}

impl SeaOrmReviewRepository {
    pub fn new(db: DatabaseConnection, locks: BookLocks) -> Self {
        Self { db, locks }
    }

    /// Attach reviewer identity to each review
    async fn with_users(&self, reviews: Vec<review::Model>) -> Result<Vec<Review>, DomainError> {
        let ids: HashSet<i32> = reviews.iter().map(|r| r.user_id).collect();
        let users: HashMap<i32, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(reviews
            .into_iter()
            .map(|r| {
                let reviewer = users.get(&r.user_id).cloned();
                let dto = Review::from(r);
                match reviewer {
                    Some(u) => dto.with_user(u),
                    None => dto,
                }
            })
            .collect())
    }

    /// Attach a book summary to each review
    async fn with_books(&self, reviews: Vec<Review>) -> Result<Vec<Review>, DomainError> {
        let ids: HashSet<i32> = reviews.iter().map(|r| r.book_id).collect();
        let books: HashMap<i32, book::Model> = book::Entity::find()
            .filter(book::Column::Id.is_in(ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        Ok(reviews
            .into_iter()
            .map(|r| match books.get(&r.book_id) {
                Some(b) => r.with_book(b.clone()),
                None => r,
            })
            .collect())
    }

    async fn paginate(
        &self,
        query: Select<ReviewEntity>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<review::Model>, u64, u64, u64), DomainError> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        let paginator = query.paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = match page_index(page, per_page, total) {
            Some(index) => paginator.fetch_page(index).await?,
            None => Vec::new(),
        };
        Ok((items, total, page, per_page))
    }

    /// `NotFound` unless the book exists. Checked before taking the book's
    /// lock so unknown ids never enter the lock registry.
    async fn ensure_book(&self, book_id: i32) -> Result<(), DomainError> {
        let found = book::Entity::find_by_id(book_id)
            .count(&self.db)
            .await?;
        if found == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn reviewer(&self, review: review::Model) -> Result<Review, DomainError> {
        let reviewer = review.find_related(user::Entity).one(&self.db).await?;
        let dto = Review::from(review);
        Ok(match reviewer {
            Some(u) => dto.with_user(u),
            None => dto,
        })
    }
}

/// Empty comments are stored as NULL
fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment.filter(|c| !c.trim().is_empty())
}

fn newest_first(query: Select<ReviewEntity>) -> Select<ReviewEntity> {
    query
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
}

fn owned_review(user_id: i32, book_id: i32, review_id: i32) -> Select<ReviewEntity> {
    ReviewEntity::find_by_id(review_id)
        .filter(Column::BookId.eq(book_id))
        .filter(Column::UserId.eq(user_id))
}

#[async_trait]
impl ReviewRepository for SeaOrmReviewRepository {
    async fn find_by_book(
        &self,
        book_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<PaginatedReviews, DomainError> {
        let query = newest_first(ReviewEntity::find().filter(Column::BookId.eq(book_id)));
        let (items, total, page, per_page) = self.paginate(query, page, per_page).await?;

        Ok(PaginatedReviews {
            reviews: self.with_users(items).await?,
            total,
            page,
            per_page,
        })
    }

    async fn latest_for_book(&self, book_id: i32, limit: u64) -> Result<Vec<Review>, DomainError> {
        let items = newest_first(ReviewEntity::find().filter(Column::BookId.eq(book_id)))
            .limit(limit)
            .all(&self.db)
            .await?;
        self.with_users(items).await
    }

    async fn find_user_review(
        &self,
        user_id: i32,
        book_id: i32,
    ) -> Result<Option<Review>, DomainError> {
        let review = ReviewEntity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::BookId.eq(book_id))
            .one(&self.db)
            .await?;

        match review {
            Some(r) => Ok(Some(self.reviewer(r).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_user(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<PaginatedReviews, DomainError> {
        let query = newest_first(ReviewEntity::find().filter(Column::UserId.eq(user_id)));
        let (items, total, page, per_page) = self.paginate(query, page, per_page).await?;
        let reviews = items.into_iter().map(Review::from).collect();

        Ok(PaginatedReviews {
            reviews: self.with_books(reviews).await?,
            total,
            page,
            per_page,
        })
    }

    async fn find_all(&self, filter: AdminReviewFilter) -> Result<Vec<Review>, DomainError> {
        let mut query = ReviewEntity::find();

        if let Some(search) = &filter.search
            && !search.trim().is_empty()
        {
            let search = search.trim();
            let matching_books = Query::select()
                .column(book::Column::Id)
                .from(book::Entity)
                .cond_where(
                    Condition::any()
                        .add(book::Column::Title.contains(search))
                        .add(book::Column::Author.contains(search)),
                )
                .to_owned();
            let matching_users = Query::select()
                .column(user::Column::Id)
                .from(user::Entity)
                .cond_where(
                    Condition::any()
                        .add(user::Column::Name.contains(search))
                        .add(user::Column::Email.contains(search)),
                )
                .to_owned();

            query = query.filter(
                Condition::any()
                    .add(Column::BookId.in_subquery(matching_books))
                    .add(Column::UserId.in_subquery(matching_users)),
            );
        }

        if let Some(book_id) = filter.book_id {
            query = query.filter(Column::BookId.eq(book_id));
        }
        if let Some(user_id) = filter.user_id {
            query = query.filter(Column::UserId.eq(user_id));
        }
        if let Some(rating) = filter.rating {
            query = query.filter(Column::Rating.eq(rating));
        }
        if let Some(min_rating) = filter.min_rating {
            query = query.filter(Column::Rating.gte(min_rating));
        }

        let column = match filter.sort_by.as_deref() {
            Some("rating") => Column::Rating,
            Some("updated_at") => Column::UpdatedAt,
            _ => Column::CreatedAt,
        };
        query = match filter.sort_order.as_deref() {
            Some("asc") => query.order_by_asc(column),
            _ => query.order_by_desc(column),
        };
        query = query.order_by_desc(Column::Id);

        let items = query.all(&self.db).await?;
        let reviews = self.with_users(items).await?;
        self.with_books(reviews).await
    }

    async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        input: ReviewInput,
    ) -> Result<Review, DomainError> {
        validation::validate_review(&input, true)?;
        let rating = input.rating.ok_or_else(|| {
            DomainError::Internal("validated review without rating".to_string())
        })?;
        self.ensure_book(book_id).await?;

        let created = self
            .locks
            .run(book_id, async {
                let txn = self.db.begin().await?;

                book::Entity::find_by_id(book_id)
                    .one(&txn)
                    .await?
                    .ok_or(DomainError::NotFound)?;

                let existing = ReviewEntity::find()
                    .filter(Column::UserId.eq(user_id))
                    .filter(Column::BookId.eq(book_id))
                    .count(&txn)
                    .await?;
                if existing > 0 {
                    return Err(DomainError::Conflict(DUPLICATE_REVIEW_MESSAGE.to_string()));
                }

                let now = now_rfc3339();
                let model = ActiveModel {
                    user_id: Set(user_id),
                    book_id: Set(book_id),
                    rating: Set(rating),
                    comment: Set(normalize_comment(input.comment.flatten())),
                    created_at: Set(now.clone()),
                    updated_at: Set(now),
                    ..Default::default()
                };
                let created = model.insert(&txn).await.map_err(|e| match DomainError::from(e) {
                    DomainError::Conflict(_) => {
                        DomainError::Conflict(DUPLICATE_REVIEW_MESSAGE.to_string())
                    }
                    other => other,
                })?;

                let summary = rating_service::recompute(&txn, book_id).await?;
                txn.commit().await?;

                tracing::info!(
                    "User {} reviewed book {} ({}), book now {:.2} over {}",
                    user_id,
                    book_id,
                    rating,
                    summary.rating,
                    summary.review_count
                );
                Ok(created)
            })
            .await?;

        self.reviewer(created).await
    }

    async fn update(
        &self,
        user_id: i32,
        book_id: i32,
        review_id: i32,
        input: ReviewInput,
    ) -> Result<Review, DomainError> {
        validation::validate_review(&input, false)?;
        self.ensure_book(book_id).await?;

        let updated = self
            .locks
            .run(book_id, async {
                let txn = self.db.begin().await?;

                let existing = owned_review(user_id, book_id, review_id)
                    .one(&txn)
                    .await?
                    .ok_or(DomainError::NotFound)?;

                let mut model: ActiveModel = existing.into();
                if let Some(rating) = input.rating {
                    model.rating = Set(rating);
                }
                if let Some(comment) = input.comment {
                    model.comment = Set(normalize_comment(comment));
                }
                model.updated_at = Set(now_rfc3339());

                let updated = model.update(&txn).await?;
                let summary = rating_service::recompute(&txn, book_id).await?;
                txn.commit().await?;

                tracing::info!(
                    "User {} updated review {} on book {}, book now {:.2} over {}",
                    user_id,
                    review_id,
                    book_id,
                    summary.rating,
                    summary.review_count
                );
                Ok(updated)
            })
            .await?;

        self.reviewer(updated).await
    }

    async fn delete_own(
        &self,
        user_id: i32,
        book_id: i32,
        review_id: i32,
    ) -> Result<(), DomainError> {
        self.ensure_book(book_id).await?;

        self.locks
            .run(book_id, async {
                let txn = self.db.begin().await?;

                owned_review(user_id, book_id, review_id)
                    .one(&txn)
                    .await?
                    .ok_or(DomainError::NotFound)?;

                ReviewEntity::delete_by_id(review_id).exec(&txn).await?;
                let summary = rating_service::recompute(&txn, book_id).await?;
                txn.commit().await?;

                tracing::info!(
                    "User {} deleted review {} on book {}, book now {:.2} over {}",
                    user_id,
                    review_id,
                    book_id,
                    summary.rating,
                    summary.review_count
                );
                Ok(())
            })
            .await
    }

    async fn delete(&self, review_id: i32) -> Result<(), DomainError> {
        let book_id = ReviewEntity::find_by_id(review_id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?
            .book_id;

        self.locks
            .run(book_id, async {
                let txn = self.db.begin().await?;

                // May have been removed while waiting for the lock
                let result = ReviewEntity::delete_by_id(review_id).exec(&txn).await?;
                if result.rows_affected == 0 {
                    return Err(DomainError::NotFound);
                }

                let summary = rating_service::recompute(&txn, book_id).await?;
                txn.commit().await?;

                tracing::info!(
                    "Review {} removed by moderation, book {} now {:.2} over {}",
                    review_id,
                    book_id,
                    summary.rating,
                    summary.review_count
                );
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_comments_become_null() {
        assert_eq!(normalize_comment(None), None);
        assert_eq!(normalize_comment(Some("   ".to_string())), None);
        assert_eq!(
            normalize_comment(Some("Loved it".to_string())),
            Some("Loved it".to_string())
        );
    }
}
