//! Repository implementations using SeaORM

pub mod book_repository;
pub mod favorite_repository;
pub mod review_repository;

pub use book_repository::SeaOrmBookRepository;
pub use favorite_repository::SeaOrmFavoriteRepository;
pub use review_repository::SeaOrmReviewRepository;
