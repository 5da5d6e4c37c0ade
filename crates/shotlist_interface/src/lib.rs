//! Trait definitions for the collaborators the pipeline drives.
//!
//! - [`GenerationBackend`] sends one text request to a model and returns
//!   its raw text.
//! - [`Studio`] is the typed set of operations the orchestrator needs:
//!   script generation, per-group prompt generation, refinement and media
//!   analysis.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod request;
mod traits;

pub use request::{GenerateRequest, GenerateRequestBuilder, MediaPart, MediaPurpose, PromptJob};
pub use traits::{GenerationBackend, Studio};
