#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use bookify::auth;
use bookify::config::Config;
use bookify::db;
use bookify::domain::NewBook;
use bookify::google_books::BookMetadataSource;
use bookify::infrastructure::AppState;
use bookify::models::{Book, book, user};
use bookify::server;

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    // Keeps the storage directory alive for the test's duration
    pub storage: TempDir,
}

pub async fn setup() -> TestApp {
    let storage = tempfile::tempdir().expect("Failed to create storage dir");
    let conn = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let state = AppState::new(conn, Config::in_memory(storage.path()));
    TestApp {
        router: server::build_router(state.clone()),
        state,
        storage,
    }
}

pub async fn setup_with_source(source: Arc<dyn BookMetadataSource>) -> TestApp {
    let storage = tempfile::tempdir().expect("Failed to create storage dir");
    let conn = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let state = AppState::with_metadata_source(conn, Config::in_memory(storage.path()), source);
    TestApp {
        router: server::build_router(state.clone()),
        state,
        storage,
    }
}

pub async fn create_user(db: &DatabaseConnection, name: &str, role: &str) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let model = user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(format!("{}@bookify.test", name.to_lowercase())),
        password_hash: Set("hash".to_string()),
        role: Set(role.to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await.expect("Failed to create user").id
}

pub fn token_for(user_id: i32, role: &str) -> String {
    auth::create_jwt(user_id, &format!("user{}@bookify.test", user_id), role)
        .expect("Failed to create token")
}

pub async fn create_book(state: &AppState, title: &str, genre: &str) -> Book {
    state
        .book_repo
        .create(NewBook {
            title: title.to_string(),
            author: format!("Author of {}", title),
            publication_year: 2000,
            genre: genre.to_string(),
            description: "A book.".to_string(),
            cover_image: None,
        })
        .await
        .expect("Failed to create book")
}

/// Force the derived rating columns, for ranking fixtures
pub async fn set_rating(db: &DatabaseConnection, book_id: i32, rating: f64, review_count: i32) {
    book::Entity::update_many()
        .col_expr(book::Column::Rating, Expr::value(rating))
        .col_expr(book::Column::ReviewCount, Expr::value(review_count))
        .filter(book::Column::Id.eq(book_id))
        .exec(db)
        .await
        .expect("Failed to set rating");
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .expect("expected a JSON array")
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect()
}
