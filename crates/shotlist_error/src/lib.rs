//! Error types for the shotlist workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use shotlist_error::{ShotlistResult, ValidationError, ValidationErrorKind};
//!
//! fn check(brief: &str) -> ShotlistResult<()> {
//!     if brief.trim().is_empty() {
//!         Err(ValidationError::new(ValidationErrorKind::EmptyBrief))?
//!     }
//!     Ok(())
//! }
//!
//! assert!(check("   ").is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod edit;
mod error;
mod generation;
mod json;
mod pipeline;
mod sanitize;
mod validation;

pub use config::ConfigError;
pub use edit::{EditError, EditErrorKind};
pub use error::{ShotlistError, ShotlistErrorKind, ShotlistResult};
pub use generation::{GenerationError, GenerationErrorKind, RetryableError};
pub use json::JsonError;
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use sanitize::{SanitizeError, SanitizeErrorKind};
pub use validation::{ValidationError, ValidationErrorKind};
