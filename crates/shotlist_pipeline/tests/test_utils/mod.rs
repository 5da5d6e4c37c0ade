//! Mock collaborators shared by the pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use shotlist_core::{
    Group, GroupId, ImagePrompts, PromptField, PromptResult, ScriptBundle, ScriptTarget,
    SettingItem, Settings, Shot,
};
use shotlist_error::{
    GenerationError, GenerationErrorKind, SanitizeError, SanitizeErrorKind, ShotlistResult,
};
use shotlist_interface::{GenerateRequest, GenerationBackend, MediaPurpose, PromptJob, Studio};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const DETECTIVE_BRIEF: &str = "a detective chases a fugitive in a rainy city";

/// A valid bundle of `shot_count` shots.
pub fn bundle(shot_count: usize) -> ScriptBundle {
    ScriptBundle {
        script: (1..=shot_count as u32)
            .map(|id| Shot {
                id,
                description: format!("Shot {id}"),
                voiceover: format!("Line {id}"),
                movement: "static".to_string(),
            })
            .collect(),
        groups: (1..=(shot_count / 4) as u32)
            .map(|id| Group::new(id, format!("Beat {id}")))
            .collect(),
        settings: Settings {
            overview: "Rain-soaked pursuit".to_string(),
            style: "neo-noir".to_string(),
            characters: vec![SettingItem {
                name: "Detective".to_string(),
                description: "Tired, relentless".to_string(),
                prompt: "trench coat, fedora".to_string(),
            }],
            scenes: vec![],
        },
    }
}

/// A prompt result whose fields mention the group.
pub fn prompt_for(group_id: GroupId) -> PromptResult {
    let mut prompts = ImagePrompts::default();
    prompts.subject = format!("subject of group {group_id}");
    prompts.lighting = "sodium streetlights".to_string();
    PromptResult::new(group_id, prompts, format!("dolly in on group {group_id}"))
}

/// Studio with scripted outcomes and call accounting.
pub struct MockStudio {
    pub script_failure: Option<GenerationErrorKind>,
    pub script_override: Option<ScriptBundle>,
    pub failing_groups: HashSet<GroupId>,
    pub script_delay: Duration,
    pub prompt_delay: Duration,
    pub refine_delay: Duration,
    pub prompt_calls: Mutex<Vec<GroupId>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Default for MockStudio {
    fn default() -> Self {
        Self {
            script_failure: None,
            script_override: None,
            failing_groups: HashSet::new(),
            script_delay: Duration::ZERO,
            prompt_delay: Duration::from_millis(1000),
            refine_delay: Duration::ZERO,
            prompt_calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

impl MockStudio {
    pub fn failing_script(kind: GenerationErrorKind) -> Self {
        Self {
            script_failure: Some(kind),
            ..Self::default()
        }
    }

    pub fn failing_groups(ids: &[GroupId]) -> Self {
        Self {
            failing_groups: ids.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn prompt_calls(&self) -> Vec<GroupId> {
        self.prompt_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Studio for MockStudio {
    async fn generate_script(&self, _brief: &str, shot_count: usize) -> ShotlistResult<ScriptBundle> {
        if !self.script_delay.is_zero() {
            tokio::time::sleep(self.script_delay).await;
        }
        if let Some(kind) = &self.script_failure {
            return Err(GenerationError::new(kind.clone()).into());
        }
        Ok(self
            .script_override
            .clone()
            .unwrap_or_else(|| bundle(shot_count)))
    }

    async fn generate_prompt(&self, job: &PromptJob) -> ShotlistResult<PromptResult> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.prompt_calls.lock().unwrap().push(job.group.id);

        tokio::time::sleep(self.prompt_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_groups.contains(&job.group.id) {
            return Err(SanitizeError::new(SanitizeErrorKind::Shape(
                "missing field `cameraPrompts`".to_string(),
            ))
            .into());
        }
        Ok(prompt_for(job.group.id))
    }

    async fn refine_script(
        &self,
        bundle: &ScriptBundle,
        instruction: &str,
        _target: Option<ScriptTarget>,
    ) -> ShotlistResult<ScriptBundle> {
        let mut refined = bundle.clone();
        for shot in &mut refined.script {
            shot.description = format!("{} ({instruction})", shot.description);
        }
        refined.settings.style = instruction.to_string();
        Ok(refined)
    }

    async fn refine_prompt(
        &self,
        result: &PromptResult,
        instruction: &str,
        _target: Option<PromptField>,
    ) -> ShotlistResult<PromptResult> {
        if !self.refine_delay.is_zero() {
            tokio::time::sleep(self.refine_delay).await;
        }
        let mut refined = result.clone();
        refined.image_prompts.lighting = instruction.to_string();
        refined.image_prompts.subject = "rewritten subject".to_string();
        refined.camera_prompts = "rewritten camera".to_string();
        Ok(refined)
    }

    async fn analyze_media(
        &self,
        data: &[u8],
        mime_type: &str,
        purpose: MediaPurpose,
    ) -> ShotlistResult<String> {
        Ok(format!("{purpose:?} of {} bytes of {mime_type}", data.len()))
    }
}

/// Backend that replays a fixed sequence of replies.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn rate_limited() -> GenerationError {
    GenerationError::new(GenerationErrorKind::Http {
        status_code: 429,
        message: "Too Many Requests".to_string(),
    })
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::new(GenerationErrorKind::EmptyResponse)))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}
