//! [`Studio`] over a raw [`GenerationBackend`].

use crate::{check_script, sanitize, sanitize_with};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shotlist_core::{
    CHUNK_SIZE, ImagePrompts, PromptField, PromptResult, ScriptBundle, ScriptTarget, group_count,
};
use shotlist_error::{GenerationError, GenerationErrorKind, JsonError, ShotlistResult};
use shotlist_interface::{
    GenerateRequest, GenerationBackend, MediaPart, MediaPurpose, PromptJob, Studio,
};
use shotlist_retry::RetryPolicy;
use tracing::{debug, instrument};

const SCRIPT_SYSTEM: &str = "You are a storyboard writer. Reply with JSON only, no prose and no \
markdown fences. Shape: {\"script\":[{\"id\":1,\"description\":\"\",\"voiceover\":\"\",\"movement\":\"\"}],\
\"groups\":[{\"id\":1,\"range\":\"1-4\",\"narrative\":\"\"}],\
\"settings\":{\"overview\":\"\",\"style\":\"\",\"characters\":[{\"name\":\"\",\"description\":\"\",\"prompt\":\"\"}],\"scenes\":[]}}";

const PROMPT_SYSTEM: &str = "You write image and camera prompts for one group of storyboard shots. \
Reply with JSON only: {\"imagePrompts\":{\"shot\":\"\",\"subject\":\"\",\"environment\":\"\",\
\"lighting\":\"\",\"camera\":\"\",\"colorGrade\":\"\",\"style\":\"\",\"quality\":\"\"},\"cameraPrompts\":\"\"}";

/// Prompt fields as returned by the model; the group id is supplied by the job.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptReply {
    image_prompts: ImagePrompts,
    camera_prompts: String,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsonError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| JsonError::new(format!("Failed to serialize prompt context: {}", e)))
}

/// Studio that composes instruction prompts and sends them to a backend.
///
/// Every call goes through the retry policy; every structured reply goes
/// through the sanitizer.
#[derive(Debug, Clone)]
pub struct LlmStudio<B> {
    backend: B,
    retry: RetryPolicy,
}

impl<B: GenerationBackend> LlmStudio<B> {
    /// Create a studio over `backend`.
    pub fn new(backend: B, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn call(&self, request: GenerateRequest) -> Result<String, GenerationError> {
        debug!(
            provider = self.backend.provider_name(),
            model = self.backend.model_name(),
            json = request.json_output(),
            "Calling generation backend"
        );
        self.retry.run(|| self.backend.generate(&request)).await
    }

    fn json_request(system: &str, prompt: String) -> Result<GenerateRequest, JsonError> {
        GenerateRequest::builder()
            .system(system)
            .prompt(prompt)
            .json_output(true)
            .build()
            .map_err(|e| JsonError::new(format!("Failed to build request: {}", e)))
    }
}

#[async_trait]
impl<B: GenerationBackend> Studio for LlmStudio<B> {
    #[instrument(skip(self, brief))]
    async fn generate_script(&self, brief: &str, shot_count: usize) -> ShotlistResult<ScriptBundle> {
        let prompt = format!(
            "Brief: {}\n\nWrite exactly {} shots numbered 1 to {}, split into {} groups of {} \
             consecutive shots each, plus settings with characters and scenes.",
            brief.trim(),
            shot_count,
            shot_count,
            group_count(shot_count),
            CHUNK_SIZE
        );
        let raw = self.call(Self::json_request(SCRIPT_SYSTEM, prompt)?).await?;

        let bundle: ScriptBundle = sanitize(&raw)?;
        check_script(&bundle, shot_count)?;
        Ok(bundle)
    }

    #[instrument(skip(self, job), fields(group_id = job.group_id()))]
    async fn generate_prompt(&self, job: &PromptJob) -> ShotlistResult<PromptResult> {
        let prompt = format!(
            "Group {} (shots {}).\nNarrative: {}\n\nShots:\n{}\n\nSettings:\n{}",
            job.group.id,
            job.group.range,
            job.group.narrative,
            to_json(&job.shots)?,
            to_json(&job.settings)?
        );
        let raw = self.call(Self::json_request(PROMPT_SYSTEM, prompt)?).await?;

        let reply: PromptReply = sanitize(&raw)?;
        Ok(PromptResult::new(
            job.group_id(),
            reply.image_prompts,
            reply.camera_prompts,
        ))
    }

    #[instrument(skip(self, bundle, instruction))]
    async fn refine_script(
        &self,
        bundle: &ScriptBundle,
        instruction: &str,
        target: Option<ScriptTarget>,
    ) -> ShotlistResult<ScriptBundle> {
        let scope = match target {
            Some(ScriptTarget::Shot(id)) => format!("Change only shot {}.", id),
            Some(ScriptTarget::Group(id)) => {
                format!("Change only group {} and its shots.", id)
            }
            Some(ScriptTarget::Settings) => "Change only the settings.".to_string(),
            None => "Keep the same number of shots and groups.".to_string(),
        };
        let prompt = format!(
            "Current script:\n{}\n\nInstruction: {}\n{} Return the complete script.",
            to_json(bundle)?,
            instruction.trim(),
            scope
        );
        let raw = self.call(Self::json_request(SCRIPT_SYSTEM, prompt)?).await?;

        let shot_count = bundle.script.len();
        let refined = sanitize_with(&raw, |refined: &ScriptBundle| {
            check_script(refined, shot_count).map_err(|e| e.kind.to_string())
        })?;
        Ok(refined)
    }

    #[instrument(skip(self, result, instruction), fields(group_id = result.group_id))]
    async fn refine_prompt(
        &self,
        result: &PromptResult,
        instruction: &str,
        target: Option<PromptField>,
    ) -> ShotlistResult<PromptResult> {
        let scope = match target {
            Some(field) => format!("Change only {}.", field),
            None => "Revise every field as needed.".to_string(),
        };
        let current = PromptReply {
            image_prompts: result.image_prompts.clone(),
            camera_prompts: result.camera_prompts.clone(),
        };
        let prompt = format!(
            "Current prompts:\n{}\n\nInstruction: {}\n{} Return every field.",
            to_json(&current)?,
            instruction.trim(),
            scope
        );
        let raw = self.call(Self::json_request(PROMPT_SYSTEM, prompt)?).await?;

        let reply: PromptReply = sanitize(&raw)?;
        Ok(PromptResult::new(
            result.group_id,
            reply.image_prompts,
            reply.camera_prompts,
        ))
    }

    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn analyze_media(
        &self,
        data: &[u8],
        mime_type: &str,
        purpose: MediaPurpose,
    ) -> ShotlistResult<String> {
        let prompt = match purpose {
            MediaPurpose::Brief => {
                "Describe this media as a short creative brief for a video: story, mood and setting."
            }
            MediaPurpose::SettingPrompt => {
                "Write a single detailed image-generation prompt that would reproduce this image."
            }
        };
        let request = GenerateRequest::builder()
            .prompt(prompt)
            .media(vec![MediaPart {
                mime_type: mime_type.to_string(),
                data: data.to_vec(),
            }])
            .build()
            .map_err(|e| JsonError::new(format!("Failed to build request: {}", e)))?;

        let text = self.call(request).await?;
        let text = crate::strip_fences(&text).to_string();
        if text.is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::EmptyResponse).into());
        }
        Ok(text)
    }
}
