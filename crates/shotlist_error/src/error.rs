//! Top-level error wrapper types.

use crate::{
    ConfigError, EditError, GenerationError, JsonError, PipelineError, RetryableError,
    SanitizeError, ValidationError,
};

/// Every error condition the workspace can produce.
///
/// # Examples
///
/// ```
/// use shotlist_error::{ShotlistError, ConfigError};
///
/// let err: ShotlistError = ConfigError::new("missing file").into();
/// assert!(format!("{}", err).contains("Config Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ShotlistErrorKind {
    /// Input validation error
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Editing error
    #[from(EditError)]
    Edit(EditError),
    /// Upstream generation error
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Response sanitization error
    #[from(SanitizeError)]
    Sanitize(SanitizeError),
    /// Orchestrator error
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
}

/// Shotlist error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Shotlist Error: {}", _0)]
pub struct ShotlistError(Box<ShotlistErrorKind>);

impl ShotlistError {
    /// Create a new error from a kind.
    pub fn new(kind: ShotlistErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ShotlistErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to ShotlistErrorKind
impl<T> From<T> for ShotlistError
where
    T: Into<ShotlistErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

impl RetryableError for ShotlistError {
    fn is_retryable(&self) -> bool {
        match self.kind() {
            ShotlistErrorKind::Generation(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for shotlist operations.
pub type ShotlistResult<T> = std::result::Result<T, ShotlistError>;
