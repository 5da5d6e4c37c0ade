//! Errors raised while recovering structured payloads from model text.

/// Specific sanitization failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SanitizeErrorKind {
    /// No structured payload could be located in the text
    #[display("No JSON payload found in response (length: {})", _0)]
    NoPayload(usize),
    /// Payload text is not valid JSON
    #[display("Failed to parse payload: {}", _0)]
    Parse(String),
    /// Payload parsed but lacks a required field or has the wrong type
    #[display("Payload does not match expected shape: {}", _0)]
    Shape(String),
    /// Payload has the right shape but violates a domain rule
    #[display("Payload rejected: {}", _0)]
    Invalid(String),
}

/// Sanitization error with source location tracking.
///
/// Never retryable: the same prompt is expected to produce the same kind
/// of malformed output.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Sanitize Error: {} at line {} in {}", kind, line, file)]
pub struct SanitizeError {
    /// The specific sanitization failure
    pub kind: SanitizeErrorKind,
    /// Line number where the error was created
    pub line: u32,
    /// File where the error was created
    pub file: &'static str,
}

impl SanitizeError {
    /// Create a new SanitizeError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SanitizeErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
