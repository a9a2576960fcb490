pub mod book;
pub mod favorite;
pub mod review;
pub mod user;

pub use book::{Book, BookInput};
pub use review::Review;
