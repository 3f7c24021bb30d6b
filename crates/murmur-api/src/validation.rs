//! Field constraints applied before anything reaches the store.

use murmur_types::MAX_TEXT_LEN;

use crate::error::ApiError;

/// SQLite's `length()` stops at the first NUL, so such strings would slip
/// past the Rust-side bounds and then trip the schema CHECKs.
fn reject_nul(field: &str, value: &str) -> Result<(), ApiError> {
    if value.contains('\0') {
        return Err(ApiError::Validation(format!("{field} must not contain NUL characters")));
    }
    Ok(())
}

/// Trimmed, non-empty.
pub fn username(value: &str) -> Result<String, ApiError> {
    reject_nul("username", value)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }
    Ok(trimmed.to_string())
}

/// Trimmed, and shaped like `local@domain.tld` with no whitespace.
pub fn email(value: &str) -> Result<String, ApiError> {
    reject_nul("email", value)?;
    let trimmed = value.trim();
    let invalid = || ApiError::Validation(format!("'{}' is not a valid email address", trimmed));

    if trimmed.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = trimmed.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(trimmed.to_string()),
        _ => Err(invalid()),
    }
}

/// Between 1 and [`MAX_TEXT_LEN`] characters, counted as chars not bytes.
pub fn text(field: &str, value: &str) -> Result<(), ApiError> {
    reject_nul(field, value)?;
    let len = value.chars().count();
    if len == 0 {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    if len > MAX_TEXT_LEN {
        return Err(ApiError::Validation(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters, got {len}"
        )));
    }
    Ok(())
}
