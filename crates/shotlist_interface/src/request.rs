//! Request types passed to collaborators.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use shotlist_core::{Group, GroupId, Settings, Shot};

/// Inline media sent alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPart {
    /// MIME type, e.g. "image/png"
    pub mime_type: String,
    /// Raw bytes
    pub data: Vec<u8>,
}

/// One text-generation request.
///
/// # Examples
///
/// ```
/// use shotlist_interface::GenerateRequest;
///
/// let request = GenerateRequest::builder()
///     .system("You write storyboards.")
///     .prompt("A heist on a train")
///     .json_output(true)
///     .build()
///     .unwrap();
///
/// assert!(*request.json_output());
/// assert!(request.media().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct GenerateRequest {
    /// System instruction
    #[builder(default, setter(into, strip_option))]
    system: Option<String>,
    /// User prompt
    prompt: String,
    /// Inline media parts
    #[builder(default)]
    media: Vec<MediaPart>,
    /// Ask the model for a JSON-only reply
    #[builder(default)]
    json_output: bool,
    /// Sampling temperature override
    #[builder(default, setter(into, strip_option))]
    temperature: Option<f32>,
}

impl GenerateRequest {
    /// Creates a new request builder.
    pub fn builder() -> GenerateRequestBuilder {
        GenerateRequestBuilder::default()
    }
}

/// Everything needed to generate prompts for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptJob {
    /// Group being generated
    pub group: Group,
    /// The group's shots, in order
    pub shots: Vec<Shot>,
    /// Shared settings
    pub settings: Settings,
}

impl PromptJob {
    /// Group id this job produces a result for.
    pub fn group_id(&self) -> GroupId {
        self.group.id
    }
}

/// What a media analysis is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaPurpose {
    /// Describe the media as a creative brief
    Brief,
    /// Reverse-engineer an image prompt for a character or scene
    SettingPrompt,
}
