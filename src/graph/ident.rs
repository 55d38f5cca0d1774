//! Identifier checks for the parts of a statement that cannot be parameterized.
//!
//! Labels, property keys and relationship types are interpolated into the
//! statement text, so they are restricted to `[A-Za-z_][A-Za-z0-9_]*`.

use crate::error::AppError;

/// Returns true when `name` is safe to interpolate into a statement.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Validates `name`, returning it unchanged on success.
pub fn identifier(name: &str) -> Result<&str, AppError> {
    if is_identifier(name) {
        Ok(name)
    } else {
        Err(AppError::InvalidIdentifier(name.to_string()))
    }
}
