//! Upstream generation errors and retry classification.

/// Conditions reported by the generation service or its transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GenerationErrorKind {
    /// API key not found in environment
    #[display("{} environment variable not set", _0)]
    MissingApiKey(String),
    /// HTTP error with status code and message
    #[display("HTTP {} error: {}", status_code, message)]
    Http {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// Quota or resource exhaustion reported inside an error payload
    #[display("Quota exhausted: {}", _0)]
    QuotaExhausted(String),
    /// Request could not be sent or the body could not be read
    #[display("Transport failure: {}", _0)]
    Transport(String),
    /// Service answered without any text
    #[display("Generation returned no text")]
    EmptyResponse,
    /// Service refused to answer
    #[display("Generation blocked: {}", _0)]
    Blocked(String),
}

impl GenerationErrorKind {
    /// True for transient capacity exhaustion: HTTP 429, or a quota /
    /// resource-exhaustion signal embedded in the error.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationErrorKind::Http {
                status_code,
                message,
            } => *status_code == 429 || mentions_exhaustion(message),
            GenerationErrorKind::QuotaExhausted(_) => true,
            _ => false,
        }
    }
}

fn mentions_exhaustion(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("resource_exhausted") || lower.contains("quota") || lower.contains("rate limit")
}

/// Generation error with source location tracking.
///
/// # Examples
///
/// ```
/// use shotlist_error::{GenerationError, GenerationErrorKind, RetryableError};
///
/// let err = GenerationError::new(GenerationErrorKind::Http {
///     status_code: 429,
///     message: "Too Many Requests".to_string(),
/// });
/// assert!(err.is_retryable());
///
/// let err = GenerationError::new(GenerationErrorKind::Http {
///     status_code: 400,
///     message: "Bad Request".to_string(),
/// });
/// assert!(!err.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The kind of error that occurred
    pub kind: GenerationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Trait for errors that can tell a retry policy whether to try again.
///
/// Only transient capacity errors (rate limiting, quota exhaustion) should
/// return true. Everything else propagates on the first failure.
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for GenerationError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
