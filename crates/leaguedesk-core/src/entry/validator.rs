// Field validation against an allowed set of names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::roster::{is_sentinel, normalize};

/// Why a field value is not acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Player name is required")]
    EmptyRequired,

    #[error("Invalid player name")]
    UnknownIdentifier,
}

/// Outcome of validating one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub reason: Option<ValidationError>,
}

impl Validation {
    const OK: Validation = Validation {
        valid: true,
        reason: None,
    };

    fn fail(reason: ValidationError) -> Self {
        Validation {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Validate `value` against `allowed`.
///
/// The sentinel is always valid; anything else must equal (case-insensitively,
/// after trimming) a member of `allowed`.
pub fn validate<I, S>(value: &str, allowed: I) -> Validation
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Validation::fail(ValidationError::EmptyRequired);
    }
    if is_sentinel(trimmed) {
        return Validation::OK;
    }

    let wanted = normalize(trimmed);
    if allowed.into_iter().any(|name| normalize(name.as_ref()) == wanted) {
        Validation::OK
    } else {
        Validation::fail(ValidationError::UnknownIdentifier)
    }
}
