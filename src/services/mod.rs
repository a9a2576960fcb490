//! Services Layer
//!
//! Catalog algorithms that sit between the HTTP handlers and the database:
//! rating aggregation, recommendations, statistics and request validation.

pub mod analytics_service;
pub mod rating_service;
pub mod recommendation_service;
pub mod validation;

pub use rating_service::RatingSummary;
pub use recommendation_service::{Recommendations, recommend};
