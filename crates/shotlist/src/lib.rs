//! Shotlist - storyboard generation from a creative brief
//!
//! A brief becomes a script of numbered shots split into groups of four,
//! plus shared settings (overview, style, characters, scenes). After
//! review, every group receives image and camera prompts from a
//! strictly sequential batch run with visible progress.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use shotlist::{
//!     GeminiClient, GenerationQueue, LlmStudio, Pipeline, RetryPolicy, ShotlistConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ShotlistConfig::load()?;
//!     let client = GeminiClient::from_config(config.model())?;
//!     let studio = LlmStudio::new(client, RetryPolicy::from_config(config.retry()));
//!     let pipeline = Pipeline::new(studio, GenerationQueue::from_config(config.queue()));
//!
//!     pipeline.submit_brief("a detective chases a fugitive in a rainy city", 8).await?;
//!     let report = pipeline.confirm_script().await?;
//!     println!("{} groups attempted", report.attempted());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `shotlist_error` - Error types
//! - `shotlist_core` - Shots, groups, settings, prompt results and their edits
//! - `shotlist_interface` - `GenerationBackend` and `Studio` traits
//! - `shotlist_retry` - Retry policy and configuration loading
//! - `shotlist_models` - Gemini REST backend
//! - `shotlist_pipeline` - Sanitizer, batch queue, phase machine and orchestrator
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod logging;

pub use logging::{default_directive, init_logging};

pub use shotlist_core::{
    BatchProgress, Brief, CHUNK_SIZE, Group, GroupId, ImagePromptField, ImagePrompts,
    PromptField, PromptResult, ScriptBundle, ScriptTarget, SettingField, SettingItem, SettingKind,
    Settings, SettingsPatch, Shot, ShotField, StylePreset, group_count, range_label, shot_span,
    validate_brief,
};
pub use shotlist_error::{
    ConfigError, EditError, EditErrorKind, GenerationError, GenerationErrorKind, JsonError,
    PipelineError, PipelineErrorKind, RetryableError, SanitizeError, SanitizeErrorKind,
    ShotlistError, ShotlistErrorKind, ShotlistResult, ValidationError, ValidationErrorKind,
};
pub use shotlist_interface::{
    GenerateRequest, GenerateRequestBuilder, GenerationBackend, MediaPart, MediaPurpose,
    PromptJob, Studio,
};
pub use shotlist_models::GeminiClient;
pub use shotlist_pipeline::{
    BatchOutcome, GenerationQueue, LlmStudio, PhaseCommand, PhaseMachine, Pipeline,
    PipelineEvent, PipelinePhase, PipelineState, QueueObserver, ResetConfirmation, RunReport,
    SNAPSHOT_VERSION, Snapshot, SnapshotMeta, render_text, sanitize,
};
pub use shotlist_retry::{
    LoggingConfig, ModelConfig, QueueConfig, RetryConfig, RetryPolicy, ShotlistConfig,
};
