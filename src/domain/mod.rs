//! Domain layer - catalog contracts
//!
//! Repository traits, their filter and input types, and the error type
//! shared by every layer. No Axum types appear here.

pub mod errors;
pub mod repositories;

pub use errors::{DomainError, ValidationErrors};
pub use repositories::*;
