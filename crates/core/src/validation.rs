//! Pilot name rules.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Shortest accepted name, in characters.
pub const MIN_NAME_LEN: usize = 2;
/// Longest accepted name, in characters.
pub const MAX_NAME_LEN: usize = 50;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\s\-'_.]+$").expect("invalid pilot name regex"));

/// Reasons a pilot name is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    /// Blank after trimming.
    #[error("Name is required")]
    Empty,
    /// Shorter than [`MIN_NAME_LEN`].
    #[error("Name must be at least 2 characters long")]
    TooShort,
    /// Longer than [`MAX_NAME_LEN`].
    #[error("Name must be less than 50 characters")]
    TooLong,
    /// Another pilot already uses the name, ignoring case.
    #[error("A pilot with this name already exists")]
    Duplicate,
    /// Characters outside letters, digits, spaces and `-'_.`.
    #[error("Name contains invalid characters")]
    InvalidCharacters,
}

/// Validate a new pilot name against the names already on the roster and
/// return the trimmed name.
pub fn validate_name<'a>(
    name: &str,
    existing: impl IntoIterator<Item = &'a str>,
) -> Result<String, NameError> {
    let trimmed = name.trim();
    let length = trimmed.chars().count();
    if length == 0 {
        return Err(NameError::Empty);
    }
    if length < MIN_NAME_LEN {
        return Err(NameError::TooShort);
    }
    if length > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }
    let lowered = trimmed.to_lowercase();
    if existing
        .into_iter()
        .any(|other| other.trim().to_lowercase() == lowered)
    {
        return Err(NameError::Duplicate);
    }
    if !NAME_RE.is_match(trimmed) {
        return Err(NameError::InvalidCharacters);
    }
    Ok(trimmed.to_string())
}
