//! External catalog sources

pub mod google_books;
