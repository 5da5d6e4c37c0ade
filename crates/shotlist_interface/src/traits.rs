//! Collaborator traits.

use crate::{GenerateRequest, MediaPurpose, PromptJob};
use async_trait::async_trait;
use shotlist_core::{PromptField, PromptResult, ScriptBundle, ScriptTarget};
use shotlist_error::{GenerationError, ShotlistResult};

/// A text-generation service.
///
/// Implementations return the raw text of the reply and make no attempt
/// to clean or parse it.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Send one request.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerationError>;

    /// Provider name (e.g., "gemini").
    fn provider_name(&self) -> &'static str;

    /// Model identifier.
    fn model_name(&self) -> &str;
}

/// Typed generation operations used by the pipeline.
///
/// Every operation either returns a fully validated structure or an error;
/// partially populated results are never returned.
#[async_trait]
pub trait Studio: Send + Sync {
    /// Generate a complete script bundle of `shot_count` shots.
    async fn generate_script(&self, brief: &str, shot_count: usize) -> ShotlistResult<ScriptBundle>;

    /// Generate image and camera prompts for one group.
    async fn generate_prompt(&self, job: &PromptJob) -> ShotlistResult<PromptResult>;

    /// Rewrite a bundle (or one part of it) following an instruction.
    async fn refine_script(
        &self,
        bundle: &ScriptBundle,
        instruction: &str,
        target: Option<ScriptTarget>,
    ) -> ShotlistResult<ScriptBundle>;

    /// Rewrite a prompt result (or one field of it) following an instruction.
    async fn refine_prompt(
        &self,
        result: &PromptResult,
        instruction: &str,
        target: Option<PromptField>,
    ) -> ShotlistResult<PromptResult>;

    /// Describe uploaded media as text.
    async fn analyze_media(
        &self,
        data: &[u8],
        mime_type: &str,
        purpose: MediaPurpose,
    ) -> ShotlistResult<String>;
}
