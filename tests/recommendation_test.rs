mod common;

use bookify::domain::DomainError;
use bookify::services::recommend;
use common::{create_book, set_rating, setup};

#[tokio::test]
async fn test_genre_match_ranks_before_rating_match() {
    let app = setup().await;
    let db = app.state.db();

    let source = create_book(&app.state, "The Hobbit", "Fantasy").await;
    let c1 = create_book(&app.state, "Earthsea", "Fantasy").await;
    let c2 = create_book(&app.state, "Foundation", "Sci-Fi").await;
    let c3 = create_book(&app.state, "Neuromancer", "Sci-Fi").await;

    set_rating(db, source.id, 4.5, 4).await;
    set_rating(db, c1.id, 3.0, 10).await;
    set_rating(db, c2.id, 4.6, 5).await;
    set_rating(db, c3.id, 1.0, 2).await;

    let recommendations = recommend(db, source.id, 12).await.unwrap();
    let ids: Vec<i32> = recommendations.books.iter().map(|b| b.id).collect();

    assert_eq!(recommendations.source.id, source.id);
    assert_eq!(ids, vec![c1.id, c2.id]);
}

#[tokio::test]
async fn test_window_is_clamped_at_five() {
    let app = setup().await;
    let db = app.state.db();

    let source = create_book(&app.state, "Source", "Drama").await;
    let lower_edge = create_book(&app.state, "Lower Edge", "Essay").await;
    let just_outside = create_book(&app.state, "Just Outside", "Essay").await;
    let perfect = create_book(&app.state, "Perfect", "Essay").await;

    set_rating(db, source.id, 4.9, 3).await;
    set_rating(db, lower_edge.id, 4.4, 1).await;
    set_rating(db, just_outside.id, 4.39, 1).await;
    set_rating(db, perfect.id, 5.0, 1).await;

    let recommendations = recommend(db, source.id, 12).await.unwrap();
    let ids: Vec<i32> = recommendations.books.iter().map(|b| b.id).collect();

    assert_eq!(ids, vec![perfect.id, lower_edge.id]);
}

#[tokio::test]
async fn test_unrated_books_recommend_each_other() {
    let app = setup().await;
    let db = app.state.db();

    let source = create_book(&app.state, "Fresh", "Travel").await;
    let other = create_book(&app.state, "Also Fresh", "Cooking").await;
    let rated = create_book(&app.state, "Rated", "Cooking").await;
    set_rating(db, rated.id, 3.0, 2).await;

    let recommendations = recommend(db, source.id, 12).await.unwrap();
    let ids: Vec<i32> = recommendations.books.iter().map(|b| b.id).collect();

    assert_eq!(ids, vec![other.id]);
}

#[tokio::test]
async fn test_limit_is_respected() {
    let app = setup().await;
    let db = app.state.db();

    let source = create_book(&app.state, "Source", "Horror").await;
    for i in 0..8 {
        create_book(&app.state, &format!("Horror {}", i), "Horror").await;
    }

    let six = recommend(db, source.id, 6).await.unwrap();
    assert_eq!(six.books.len(), 6);

    let none = recommend(db, source.id, 0).await.unwrap();
    assert!(none.books.is_empty());

    let all = recommend(db, source.id, 100).await.unwrap();
    assert_eq!(all.books.len(), 8);
}

#[tokio::test]
async fn test_unknown_source_is_not_found() {
    let app = setup().await;

    let result = recommend(app.state.db(), 4242, 12).await;
    assert!(matches!(result, Err(DomainError::NotFound)));
}
