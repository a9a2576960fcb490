use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    /// 0.5 - 5.0 in half-star steps.
    pub rating: f64,
    pub comment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::book::Entity",
        from = "Column::BookId",
        to = "super::book::Column::Id",
        on_delete = "Cascade"
    )]
    Book,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Reviewer identity embedded in review responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReviewUser {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Book summary embedded in review responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReviewBook {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub cover_image: Option<String>,
    pub rating: f64,
}

// DTO for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub rating: f64,
    pub comment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ReviewUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book: Option<ReviewBook>,
}

impl From<Model> for Review {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            book_id: model.book_id,
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at,
            updated_at: model.updated_at,
            user: None,
            book: None,
        }
    }
}

impl Review {
    pub fn with_user(mut self, user: super::user::Model) -> Self {
        self.user = Some(ReviewUser {
            id: user.id,
            name: user.name,
            email: user.email,
        });
        self
    }

    pub fn with_book(mut self, book: super::book::Model) -> Self {
        self.book = Some(ReviewBook {
            id: book.id,
            title: book.title,
            author: book.author,
            genre: book.genre,
            cover_image: book.cover_image,
            rating: book.rating,
        });
        self
    }
}
