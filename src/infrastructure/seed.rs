//! Demo accounts and a starter catalog

use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

use crate::domain::{BookRepository, DomainError, NewBook};
use crate::infrastructure::auth::hash_password;
use crate::models::user::{self, ROLE_ADMIN, ROLE_USER};
use crate::utils::now_rfc3339;

pub const ADMIN_EMAIL: &str = "admin@bookify.com";
pub const USER_EMAIL: &str = "user@bookify.com";

// (title, author, year, genre, description)
const BOOKS: [(&str, &str, i32, &str, &str); 12] = [
    (
        "To Kill a Mockingbird",
        "Harper Lee",
        1960,
        "Fiction",
        "A coming-of-age tale in a Southern town poisoned by prejudice.",
    ),
    (
        "1984",
        "George Orwell",
        1949,
        "Science Fiction",
        "A dystopian novel about the dangers of totalitarianism.",
    ),
    (
        "Pride and Prejudice",
        "Jane Austen",
        1813,
        "Romance",
        "A novel of manners following the emotional development of Elizabeth Bennet.",
    ),
    (
        "The Great Gatsby",
        "F. Scott Fitzgerald",
        1925,
        "Fiction",
        "A tragic love story set in the Jazz Age.",
    ),
    (
        "The Hobbit",
        "J.R.R. Tolkien",
        1937,
        "Fantasy",
        "Bilbo Baggins sets out to win a share of a dragon's treasure.",
    ),
    (
        "Dune",
        "Frank Herbert",
        1965,
        "Science Fiction",
        "Politics, religion and ecology on the desert planet Arrakis.",
    ),
    (
        "Foundation",
        "Isaac Asimov",
        1951,
        "Science Fiction",
        "A mathematician foresees the fall of the Galactic Empire.",
    ),
    (
        "The Name of the Wind",
        "Patrick Rothfuss",
        2007,
        "Fantasy",
        "Kvothe recounts how he became the most notorious wizard of his age.",
    ),
    (
        "The Odyssey",
        "Homer",
        -700,
        "Poetry",
        "Odysseus struggles for ten years to return home after the Trojan War.",
    ),
    (
        "The Republic",
        "Plato",
        -375,
        "Philosophy",
        "A Socratic dialogue on justice and the ideal city.",
    ),
    (
        "The Art of War",
        "Sun Tzu",
        -500,
        "Philosophy",
        "An ancient treatise on military strategy.",
    ),
    (
        "Sapiens",
        "Yuval Noah Harari",
        2011,
        "History",
        "A brief history of humankind.",
    ),
];

async fn ensure_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<(), DomainError> {
    let password_hash = hash_password(password).map_err(DomainError::Internal)?;
    let now = now_rfc3339();

    let model = user::ActiveModel {
        name: Set(name.to_owned()),
        email: Set(email.to_owned()),
        password_hash: Set(password_hash),
        role: Set(role.to_owned()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    let inserted = user::Entity::insert(model)
        .on_conflict(OnConflict::column(user::Column::Email).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;
    if inserted > 0 {
        tracing::info!("Seeded {} account {}", role, email);
    }
    Ok(())
}

/// Create the demo accounts and starter books. Safe to run repeatedly.
pub async fn seed_demo_data(
    db: &DatabaseConnection,
    books: &dyn BookRepository,
) -> Result<(), DomainError> {
    ensure_user(db, "Admin Bookify", ADMIN_EMAIL, "admin123", ROLE_ADMIN).await?;
    ensure_user(db, "User Demo", USER_EMAIL, "user123", ROLE_USER).await?;

    let mut created = 0;
    for (title, author, year, genre, description) in BOOKS {
        if books.exists(title, author).await? {
            continue;
        }
        books
            .create(NewBook {
                title: title.to_owned(),
                author: author.to_owned(),
                publication_year: year,
                genre: genre.to_owned(),
                description: description.to_owned(),
                cover_image: None,
            })
            .await?;
        created += 1;
    }

    tracing::info!("Seeded {} books", created);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BookFilter;
    use crate::infrastructure::db;
    use crate::infrastructure::repositories::SeaOrmBookRepository;
    use crate::infrastructure::state::BookLocks;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let conn = db::init_db("sqlite::memory:").await.unwrap();
        let repo = SeaOrmBookRepository::new(conn.clone(), BookLocks::new());

        seed_demo_data(&conn, &repo).await.unwrap();
        seed_demo_data(&conn, &repo).await.unwrap();

        assert_eq!(user::Entity::find().count(&conn).await.unwrap(), 2);

        let catalog = repo.find_all(BookFilter::default()).await.unwrap();
        assert_eq!(catalog.total, BOOKS.len() as u64);
        assert!(catalog.books.iter().any(|b| b.publication_year < 0));
        assert!(catalog
            .books
            .iter()
            .all(|b| b.rating == 0.0 && b.review_count == 0));
    }
}
