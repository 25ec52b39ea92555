//! Custom rules for `#[derive(Validate)]` forms.

use std::borrow::Cow;

use validator::ValidationError;

use crate::services::slugs::is_valid_slug;

pub const REQUIRED_MESSAGE: &str = "This field is required.";

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::from(message));
    error
}

pub fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("is_required", REQUIRED_MESSAGE))
    } else {
        Ok(())
    }
}

pub fn validate_slug(value: &str) -> Result<(), ValidationError> {
    if is_valid_slug(value) {
        Ok(())
    } else {
        Err(error(
            "slug",
            "Enter a valid slug consisting of lowercase letters, numbers, underscores or hyphens.",
        ))
    }
}
