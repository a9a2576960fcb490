use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub author: String,
    /// May be negative for BCE works.
    pub publication_year: i32,
    /// Free-text label. Recommendations compare it by exact string equality.
    pub genre: String,
    pub description: String,
    /// Derived from the book's reviews, 0.00 - 5.00. Only the rating
    /// aggregator writes this column.
    pub rating: f64,
    /// Derived from the book's reviews.
    pub review_count: i32,
    /// Path relative to the storage root, e.g. `covers/google_book_<uuid>.jpg`.
    pub cover_image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::favorite::Entity")]
    Favorites,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::favorite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// DTO for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub genre: String,
    pub description: String,
    pub rating: f64,
    pub review_count: i32,
    pub cover_image: Option<String>,
    /// Public URL of the stored cover, derived from `cover_image`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Model> for Book {
    fn from(model: Model) -> Self {
        let cover_url = model
            .cover_image
            .as_ref()
            .map(|path| format!("/storage/{}", path));

        Self {
            id: model.id,
            title: model.title,
            author: model.author,
            publication_year: model.publication_year,
            genre: model.genre,
            description: model.description,
            rating: model.rating,
            review_count: model.review_count,
            cover_image: model.cover_image,
            cover_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Catalog fields an administrator may set. Unknown keys such as `rating`
/// or `review_count` are ignored.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_year: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    /// Filename returned by the Google Books cover download.
    pub google_books_cover: Option<String>,
}
