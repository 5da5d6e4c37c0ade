//! Generation backends for shotlist.
//!
//! Currently provides [`GeminiClient`], a [`GenerationBackend`] over the
//! Gemini `generateContent` REST endpoint.
//!
//! [`GenerationBackend`]: shotlist_interface::GenerationBackend

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod gemini;

pub use gemini::{GeminiClient, classify_error};
