//! Input validation errors, raised before any upstream call is made.

/// Specific validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ValidationErrorKind {
    /// Brief is empty or whitespace only
    #[display("Brief cannot be empty")]
    EmptyBrief,
    /// Shot count is zero or not a multiple of the group size
    #[display("Shot count {} must be a positive multiple of {}", count, chunk_size)]
    InvalidShotCount {
        /// Requested shot count
        count: usize,
        /// Required group size
        chunk_size: usize,
    },
    /// Groups do not contiguously partition the script
    #[display("Groups do not partition the script: {}", _0)]
    PartitionMismatch(String),
    /// Shot ids are not 1-based and contiguous
    #[display("Shot ids must be contiguous from 1: {}", _0)]
    ShotIds(String),
    /// Bundle or snapshot shape is unusable
    #[display("Malformed bundle: {}", _0)]
    MalformedBundle(String),
}

/// Validation error with source location tracking.
///
/// # Examples
///
/// ```
/// use shotlist_error::{ValidationError, ValidationErrorKind};
///
/// let err = ValidationError::new(ValidationErrorKind::InvalidShotCount {
///     count: 6,
///     chunk_size: 4,
/// });
/// assert!(format!("{}", err).contains("multiple of 4"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", kind, line, file)]
pub struct ValidationError {
    /// The specific validation failure
    pub kind: ValidationErrorKind,
    /// Line number where the error was created
    pub line: u32,
    /// File where the error was created
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new ValidationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
