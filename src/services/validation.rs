//! Request validation
//!
//! Failures are collected per field and returned together as
//! `DomainError::Validation`; nothing is written when any rule fails.

use chrono::Datelike;

use crate::domain::{BookChanges, DomainError, NewBook, ReviewInput, ValidationErrors};
use crate::models::BookInput;

pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_AUTHOR_LEN: usize = 255;
pub const MAX_GENRE_LEN: usize = 100;
pub const MAX_COMMENT_LEN: usize = 1000;
pub const MIN_REVIEW_RATING: f64 = 0.5;
pub const MAX_REVIEW_RATING: f64 = 5.0;
pub const MIN_PASSWORD_LEN: usize = 8;

fn check_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&String>,
    max_len: Option<usize>,
    required: bool,
) {
    match value.map(|v| v.trim()) {
        None | Some("") if required => {
            errors.add(field, format!("The {} field is required.", field));
        }
        Some(v) => {
            if let Some(max) = max_len
                && v.chars().count() > max
            {
                errors.add(
                    field,
                    format!("The {} may not be greater than {} characters.", field, max),
                );
            }
        }
        None => {}
    }
}

fn check_year(errors: &mut ValidationErrors, year: Option<i32>, required: bool) {
    match year {
        None if required => errors.add(
            "publication_year",
            "The publication year field is required.",
        ),
        Some(year) => {
            let current = chrono::Utc::now().year();
            if year > current {
                errors.add(
                    "publication_year",
                    format!("The publication year may not be greater than {}.", current),
                );
            }
        }
        None => {}
    }
}

fn cover(input: &BookInput) -> Option<String> {
    input
        .google_books_cover
        .as_ref()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// Validate a full catalog entry
pub fn validate_new_book(input: BookInput) -> Result<NewBook, DomainError> {
    let mut errors = ValidationErrors::new();
    check_text(&mut errors, "title", input.title.as_ref(), Some(MAX_TITLE_LEN), true);
    check_text(&mut errors, "author", input.author.as_ref(), Some(MAX_AUTHOR_LEN), true);
    check_year(&mut errors, input.publication_year, true);
    check_text(&mut errors, "genre", input.genre.as_ref(), Some(MAX_GENRE_LEN), true);
    check_text(&mut errors, "description", input.description.as_ref(), None, true);
    errors.into_result()?;

    let cover_image = cover(&input);
    Ok(NewBook {
        title: trimmed(input.title).unwrap_or_default(),
        author: trimmed(input.author).unwrap_or_default(),
        publication_year: input.publication_year.unwrap_or_default(),
        genre: trimmed(input.genre).unwrap_or_default(),
        description: trimmed(input.description).unwrap_or_default(),
        cover_image,
    })
}

/// Validate a partial catalog update. Fields that are present must satisfy
/// the same rules as on creation.
pub fn validate_book_changes(input: BookInput) -> Result<BookChanges, DomainError> {
    let mut errors = ValidationErrors::new();
    if input.title.is_some() {
        check_text(&mut errors, "title", input.title.as_ref(), Some(MAX_TITLE_LEN), true);
    }
    if input.author.is_some() {
        check_text(&mut errors, "author", input.author.as_ref(), Some(MAX_AUTHOR_LEN), true);
    }
    check_year(&mut errors, input.publication_year, false);
    if input.genre.is_some() {
        check_text(&mut errors, "genre", input.genre.as_ref(), Some(MAX_GENRE_LEN), true);
    }
    if input.description.is_some() {
        check_text(&mut errors, "description", input.description.as_ref(), None, true);
    }
    errors.into_result()?;

    let cover_image = cover(&input);
    Ok(BookChanges {
        title: trimmed(input.title),
        author: trimmed(input.author),
        publication_year: input.publication_year,
        genre: trimmed(input.genre),
        description: trimmed(input.description),
        cover_image,
    })
}

/// True for 0.5, 1.0, ... 5.0
pub fn is_valid_review_rating(rating: f64) -> bool {
    rating.is_finite()
        && (MIN_REVIEW_RATING..=MAX_REVIEW_RATING).contains(&rating)
        && (rating * 2.0).fract() == 0.0
}

/// Validate a review payload. `rating` is mandatory on creation only.
pub fn validate_review(input: &ReviewInput, creating: bool) -> Result<(), DomainError> {
    let mut errors = ValidationErrors::new();

    match input.rating {
        None if creating => errors.add("rating", "The rating field is required."),
        Some(rating) if !is_valid_review_rating(rating) => errors.add(
            "rating",
            "The rating must be between 0.5 and 5.0 in steps of 0.5.",
        ),
        _ => {}
    }

    if let Some(Some(comment)) = &input.comment
        && comment.chars().count() > MAX_COMMENT_LEN
    {
        errors.add(
            "comment",
            format!(
                "The comment may not be greater than {} characters.",
                MAX_COMMENT_LEN
            ),
        );
    }

    errors.into_result()
}

/// Validate account registration fields
pub fn validate_registration(name: &str, email: &str, password: &str) -> Result<(), DomainError> {
    let mut errors = ValidationErrors::new();
    if name.trim().is_empty() {
        errors.add("name", "The name field is required.");
    } else if name.chars().count() > 255 {
        errors.add("name", "The name may not be greater than 255 characters.");
    }

    let email = email.trim();
    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid_email {
        errors.add("email", "The email must be a valid email address.");
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("The password must be at least {} characters.", MIN_PASSWORD_LEN),
        );
    }
    errors.into_result()
}
