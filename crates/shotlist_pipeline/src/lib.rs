//! Generation orchestration for the shotlist storyboard pipeline.
//!
//! - [`sanitize`] recovers a validated payload from raw model text.
//! - [`GenerationQueue`] drives per-group generation strictly one item at
//!   a time, isolating failures and publishing progress.
//! - [`PhaseMachine`] decides which commands are legal in which phase.
//! - [`Pipeline`] owns the bundle, prompt results and phase, and exposes
//!   the command surface plus an event subscription.
//! - [`LlmStudio`] implements [`Studio`](shotlist_interface::Studio) over
//!   any [`GenerationBackend`](shotlist_interface::GenerationBackend).
//! - [`Snapshot`] and [`render_text`] handle export and import.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod export;
mod phase;
mod pipeline;
mod queue;
mod sanitizer;
mod studio;

pub use export::{SNAPSHOT_VERSION, Snapshot, SnapshotMeta, render_text};
pub use phase::{PhaseCommand, PhaseMachine, PipelinePhase, Transition};
pub use pipeline::{Pipeline, PipelineEvent, PipelineState, ResetConfirmation, RunReport};
pub use queue::{BatchOutcome, GenerationQueue, QueueObserver, SilentObserver, WorkItem};
pub use sanitizer::{check_script, extract_json, sanitize, sanitize_with, strip_fences};
pub use studio::LlmStudio;
