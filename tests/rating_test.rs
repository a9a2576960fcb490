mod common;

use std::sync::Arc;

use bookify::domain::{DomainError, ReviewInput};
use bookify::models::review;
use bookify::models::user::ROLE_USER;
use bookify::services::rating_service;
use common::{create_book, create_user, setup};
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};

fn rating(value: f64) -> ReviewInput {
    ReviewInput {
        rating: Some(value),
        comment: None,
    }
}

#[tokio::test]
async fn test_mean_rounds_and_follows_deletes() {
    let app = setup().await;
    let db = app.state.db();
    let book = create_book(&app.state, "Dune", "Science Fiction").await;

    let alice = create_user(db, "Alice", ROLE_USER).await;
    let bob = create_user(db, "Bob", ROLE_USER).await;
    let carol = create_user(db, "Carol", ROLE_USER).await;

    let repo = &app.state.review_repo;
    repo.create(alice, book.id, rating(5.0)).await.unwrap();
    repo.create(bob, book.id, rating(4.0)).await.unwrap();
    let third = repo.create(carol, book.id, rating(3.5)).await.unwrap();

    let after_create = app.state.book_repo.find_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(after_create.rating, 4.17);
    assert_eq!(after_create.review_count, 3);

    repo.delete_own(carol, book.id, third.id).await.unwrap();

    let after_delete = app.state.book_repo.find_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(after_delete.rating, 4.5);
    assert_eq!(after_delete.review_count, 2);
}

#[tokio::test]
async fn test_last_review_deleted_resets_to_zero() {
    let app = setup().await;
    let db = app.state.db();
    let book = create_book(&app.state, "Emma", "Romance").await;
    let user = create_user(db, "Dana", ROLE_USER).await;

    let review = app
        .state
        .review_repo
        .create(user, book.id, rating(2.5))
        .await
        .unwrap();
    app.state.review_repo.delete(review.id).await.unwrap();

    let book = app.state.book_repo.find_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(book.rating, 0.0);
    assert_eq!(book.review_count, 0);
}

#[tokio::test]
async fn test_update_recomputes_and_keeps_comment_when_absent() {
    let app = setup().await;
    let db = app.state.db();
    let book = create_book(&app.state, "Ulysses", "Fiction").await;
    let user = create_user(db, "Eve", ROLE_USER).await;

    let review = app
        .state
        .review_repo
        .create(
            user,
            book.id,
            ReviewInput {
                rating: Some(2.0),
                comment: Some(Some("Slow start".to_string())),
            },
        )
        .await
        .unwrap();

    let updated = app
        .state
        .review_repo
        .update(user, book.id, review.id, rating(4.5))
        .await
        .unwrap();
    assert_eq!(updated.rating, 4.5);
    assert_eq!(updated.comment.as_deref(), Some("Slow start"));

    let book = app.state.book_repo.find_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(book.rating, 4.5);
    assert_eq!(book.review_count, 1);
}

#[tokio::test]
async fn test_duplicate_review_is_rejected_without_side_effects() {
    let app = setup().await;
    let db = app.state.db();
    let book = create_book(&app.state, "Beloved", "Fiction").await;
    let user = create_user(db, "Frank", ROLE_USER).await;

    app.state
        .review_repo
        .create(user, book.id, rating(3.0))
        .await
        .unwrap();

    let second = app.state.review_repo.create(user, book.id, rating(5.0)).await;
    assert!(matches!(second, Err(DomainError::Conflict(_))));

    let book = app.state.book_repo.find_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(book.rating, 3.0);
    assert_eq!(book.review_count, 1);
}

#[tokio::test]
async fn test_invalid_rating_leaves_book_untouched() {
    let app = setup().await;
    let db = app.state.db();
    let book = create_book(&app.state, "Hamlet", "Drama").await;
    let user = create_user(db, "Gus", ROLE_USER).await;

    for bad in [0.0, 0.3, 5.5, 4.25] {
        let result = app.state.review_repo.create(user, book.id, rating(bad)).await;
        assert!(matches!(result, Err(DomainError::Validation(_))), "{}", bad);
    }

    let book = app.state.book_repo.find_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(book.review_count, 0);
}

#[tokio::test]
async fn test_review_for_unknown_book_is_not_found() {
    let app = setup().await;
    let user = create_user(app.state.db(), "Hal", ROLE_USER).await;

    let result = app.state.review_repo.create(user, 999, rating(4.0)).await;
    assert!(matches!(result, Err(DomainError::NotFound)));
}

#[tokio::test]
async fn test_foreign_review_cannot_be_edited() {
    let app = setup().await;
    let db = app.state.db();
    let book = create_book(&app.state, "Walden", "Philosophy").await;
    let owner = create_user(db, "Ivy", ROLE_USER).await;
    let other = create_user(db, "Jon", ROLE_USER).await;

    let review = app
        .state
        .review_repo
        .create(owner, book.id, rating(3.0))
        .await
        .unwrap();

    let update = app
        .state
        .review_repo
        .update(other, book.id, review.id, rating(1.0))
        .await;
    assert!(matches!(update, Err(DomainError::NotFound)));

    let delete = app.state.review_repo.delete_own(other, book.id, review.id).await;
    assert!(matches!(delete, Err(DomainError::NotFound)));
}

#[tokio::test]
async fn test_concurrent_reviews_are_all_counted() {
    let app = setup().await;
    let db = app.state.db();
    let book = create_book(&app.state, "Middlemarch", "Fiction").await;

    let mut users = Vec::new();
    for i in 0..12 {
        users.push(create_user(db, &format!("Reader{}", i), ROLE_USER).await);
    }

    let repo = Arc::clone(&app.state.review_repo);
    let handles: Vec<_> = users
        .iter()
        .enumerate()
        .map(|(i, user)| {
            let repo = Arc::clone(&repo);
            let user = *user;
            let value = if i % 2 == 0 { 5.0 } else { 4.0 };
            tokio::spawn(async move { repo.create(user, book.id, rating(value)).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let book = app.state.book_repo.find_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(book.review_count, 12);
    assert_eq!(book.rating, 4.5);
}

#[tokio::test]
async fn test_failed_recompute_rolls_back_review() {
    let app = setup().await;
    let db = app.state.db();
    let book = create_book(&app.state, "Frankenstein", "Horror").await;
    let first = create_user(db, "Victor", ROLE_USER).await;
    let second = create_user(db, "Elizabeth", ROLE_USER).await;

    app.state
        .review_repo
        .create(first, book.id, rating(4.0))
        .await
        .unwrap();

    db.execute_unprepared(
        "CREATE TRIGGER freeze_books BEFORE UPDATE ON books \
         BEGIN SELECT RAISE(ABORT, 'books are read-only'); END",
    )
    .await
    .unwrap();

    let result = app.state.review_repo.create(second, book.id, rating(1.0)).await;
    assert!(result.is_err());

    db.execute_unprepared("DROP TRIGGER freeze_books").await.unwrap();

    assert_eq!(review::Entity::find().count(db).await.unwrap(), 1);
    let stored = app.state.book_repo.find_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(stored.rating, 4.0);
    assert_eq!(stored.review_count, 1);

    // The rolled-back write left nothing behind that blocks a retry
    app.state
        .review_repo
        .create(second, book.id, rating(1.0))
        .await
        .unwrap();
    let stored = app.state.book_repo.find_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(stored.rating, 2.5);
    assert_eq!(stored.review_count, 2);
}

#[tokio::test]
async fn test_recompute_is_idempotent() {
    let app = setup().await;
    let db = app.state.db();
    let book = create_book(&app.state, "Rebecca", "Mystery").await;
    for (name, value) in [("Max", 5.0), ("Mrs Danvers", 2.0), ("Frank", 3.5)] {
        let user = create_user(db, name, ROLE_USER).await;
        app.state
            .review_repo
            .create(user, book.id, rating(value))
            .await
            .unwrap();
    }

    let first = rating_service::recompute(db, book.id).await.unwrap();
    let second = rating_service::recompute(db, book.id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.rating, 3.5);
    assert_eq!(first.review_count, 3);

    let stored = app.state.book_repo.find_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(stored.rating, second.rating);
    assert_eq!(stored.review_count, second.review_count);
}

#[tokio::test]
async fn test_unknown_books_leave_no_lock_entries() {
    let app = setup().await;
    let user = create_user(app.state.db(), "Mallory", ROLE_USER).await;
    let repo = &app.state.review_repo;

    for book_id in 10_000..10_200 {
        let created = repo.create(user, book_id, rating(4.0)).await;
        assert!(matches!(created, Err(DomainError::NotFound)));

        let updated = repo.update(user, book_id, 1, rating(3.0)).await;
        assert!(matches!(updated, Err(DomainError::NotFound)));

        let deleted = repo.delete_own(user, book_id, 1).await;
        assert!(matches!(deleted, Err(DomainError::NotFound)));
    }
    let removed = app.state.book_repo.delete(10_000).await;
    assert!(matches!(removed, Err(DomainError::NotFound)));

    assert!(app.state.locks.is_empty());

    // A missing review on an existing book does not keep the entry either
    let book = create_book(&app.state, "Real Book", "Fiction").await;
    let missing = repo.delete_own(user, book.id, 999).await;
    assert!(matches!(missing, Err(DomainError::NotFound)));
    assert!(app.state.locks.is_empty());
}
