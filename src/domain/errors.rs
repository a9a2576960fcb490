//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Field name -> list of messages, serialized as `{ "rating": ["..."] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded, otherwise a `DomainError::Validation`.
    pub fn into_result(self) -> Result<(), DomainError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

#[derive(Debug)]
pub enum DomainError {
    /// Resource not found
    NotFound,
    /// Write rejected because it collides with existing state (duplicate review, ...)
    Conflict(String),
    /// Per-field validation failures
    Validation(ValidationErrors),
    /// Missing or invalid credentials
    Unauthorized,
    /// Authenticated but not allowed
    Forbidden,
    /// Database/persistence error
    Database(String),
    /// External service error
    External(String),
    /// Generic internal error
    Internal(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::NotFound => write!(f, "Resource not found"),
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::Validation(errors) => {
                let fields: Vec<&str> = errors.fields().collect();
                write!(f, "Validation error on: {}", fields.join(", "))
            }
            DomainError::Unauthorized => write!(f, "Unauthorized"),
            DomainError::Forbidden => write!(f, "Forbidden"),
            DomainError::Database(msg) => write!(f, "Database error: {}", msg),
            DomainError::External(msg) => write!(f, "External service error: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        match e.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => DomainError::Conflict(msg),
            _ => DomainError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.add("rating", "The rating field is required.");
        errors.add("rating", "The rating must be at least 0.5.");
        errors.add("comment", "The comment may not be greater than 1000 characters.");

        assert!(errors.has("rating"));
        assert!(!errors.has("title"));

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["rating"].as_array().unwrap().len(), 2);
        assert_eq!(json["comment"].as_array().unwrap().len(), 1);

        match errors.into_result() {
            Err(DomainError::Validation(e)) => {
                assert_eq!(e.fields().collect::<Vec<_>>(), vec!["comment", "rating"])
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
