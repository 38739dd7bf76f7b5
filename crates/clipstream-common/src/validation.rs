//! Input validation utilities.
//!
//! Centralized validation helpers used across API routes.

use std::sync::LazyLock;

use validator::Validate;

use crate::error::ClipError;

pub static USERNAME_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[a-zA-Z0-9._-]+$").expect("static regex"));

/// Validate a request body, returning a ClipError::Validation on failure.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), ClipError> {
    body.validate()
        .map_err(|e| ClipError::validation(format_validation_errors(e)))
}

/// Format validation errors into a human-readable string.
fn format_validation_errors(errors: validator::ValidationErrors) -> String {
    let mut messages = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for '{field}'"))
            })
        })
        .collect::<Vec<_>>();
    // HashMap iteration order is random; keep messages stable for clients.
    messages.sort();
    messages.join("; ")
}

/// Trim `value` and fail if nothing is left.
pub fn require_non_blank<'a>(field: &str, value: &'a str) -> Result<&'a str, ClipError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClipError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// Canonical form of a unique identity field (username or email).
pub fn normalize_identity(value: &str) -> String {
    value.trim().to_lowercase()
}
