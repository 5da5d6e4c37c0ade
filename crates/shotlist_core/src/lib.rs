//! Core data types for the shotlist storyboard pipeline.
//!
//! A brief becomes a [`ScriptBundle`]: an ordered list of [`Shot`]s,
//! partitioned into fixed-size [`Group`]s, plus shared [`Settings`].
//! Each group later receives one [`PromptResult`]. Everything here is
//! plain data with pure, synchronous editing operations.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod brief;
mod bundle;
mod group;
mod progress;
mod prompt;
mod setting;
mod shot;

pub use brief::{Brief, validate_brief};
pub use bundle::{ScriptBundle, ScriptTarget};
pub use group::{CHUNK_SIZE, Group, GroupId, group_count, range_label, shot_span};
pub use progress::BatchProgress;
pub use prompt::{ImagePromptField, ImagePrompts, PromptField, PromptResult};
pub use setting::{SettingField, SettingItem, SettingKind, Settings, SettingsPatch, StylePreset};
pub use shot::{Shot, ShotField};
