//! Creative brief input.

use crate::CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use shotlist_error::{ValidationError, ValidationErrorKind};

/// A validated request to generate a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brief {
    /// Free-text creative idea
    pub text: String,
    /// Number of shots to generate
    pub shot_count: usize,
}

impl Brief {
    /// Validate and build a brief.
    ///
    /// # Errors
    ///
    /// See [`validate_brief`].
    pub fn new(text: impl Into<String>, shot_count: usize) -> Result<Self, ValidationError> {
        let text = text.into();
        validate_brief(&text, shot_count)?;
        Ok(Self { text, shot_count })
    }
}

/// Check a brief before any call is made.
///
/// The text must be non-empty and `shot_count` a positive multiple of
/// [`CHUNK_SIZE`]. Nothing else is checked.
///
/// # Examples
///
/// ```
/// use shotlist_core::validate_brief;
///
/// assert!(validate_brief("a detective chases a fugitive", 8).is_ok());
/// assert!(validate_brief("a detective chases a fugitive", 6).is_err());
/// assert!(validate_brief("  ", 8).is_err());
/// ```
pub fn validate_brief(text: &str, shot_count: usize) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::new(ValidationErrorKind::EmptyBrief));
    }
    if shot_count == 0 || shot_count % CHUNK_SIZE != 0 {
        return Err(ValidationError::new(ValidationErrorKind::InvalidShotCount {
            count: shot_count,
            chunk_size: CHUNK_SIZE,
        }));
    }
    Ok(())
}
