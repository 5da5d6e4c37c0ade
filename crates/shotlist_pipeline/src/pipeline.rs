//! The orchestrator: owns the bundle, prompt results and phase.

use crate::{
    BatchOutcome, GenerationQueue, PhaseCommand, PhaseMachine, PipelinePhase, QueueObserver,
    Snapshot, check_script,
};
use async_trait::async_trait;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use shotlist_core::{
    BatchProgress, GroupId, PromptField, PromptResult, ScriptBundle, ScriptTarget, SettingItem,
    SettingKind, validate_brief,
};
use shotlist_error::{
    EditError, EditErrorKind, PipelineError, PipelineErrorKind, ShotlistResult,
};
use shotlist_interface::{MediaPurpose, PromptJob, Studio};
use std::collections::BTreeMap;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, error, info, instrument, warn};

const EVENT_CAPACITY: usize = 256;

/// Notifications published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PipelineEvent {
    /// The phase changed
    PhaseChanged {
        /// Previous phase
        from: PipelinePhase,
        /// New phase
        to: PipelinePhase,
    },
    /// A group is about to be generated
    ItemStarted(GroupId),
    /// A group received a result
    ItemSucceeded(GroupId),
    /// A group failed and was skipped
    ItemFailed {
        /// Failed group
        group_id: GroupId,
        /// Error message
        message: String,
    },
    /// Batch progress changed; `None` once the run is over
    Progress(Option<BatchProgress>),
    /// A batch run exhausted its work list
    RunFinished {
        /// Items attempted
        attempted: usize,
        /// Groups that failed
        failed: Vec<GroupId>,
    },
    /// A phase-level failure
    Error(String),
}

/// Explicit consent for [`Pipeline::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetConfirmation {
    /// The caller confirmed discarding all work
    Confirmed,
    /// The caller declined
    Declined,
}

/// Summary of a confirm or regenerate command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct RunReport {
    /// Items attempted; zero when no run was needed
    attempted: usize,
    /// Groups left without a fresh result
    failed: Vec<GroupId>,
}

/// Everything the orchestrator owns.
#[derive(Debug, Clone, Default, Getters)]
pub struct PipelineState {
    /// Phase machine
    machine: PhaseMachine,
    /// Current bundle
    bundle: Option<ScriptBundle>,
    /// Prompt results by group
    prompts: BTreeMap<GroupId, PromptResult>,
    /// Group highlighted for the user; set by selection and by each batch item
    active_group: Option<GroupId>,
    /// Item a batch run is generating right now
    generating_group: Option<GroupId>,
    /// Present only while a batch run is active
    progress: Option<BatchProgress>,
    /// Message of the last phase-level failure
    last_error: Option<String>,
    /// Bumped by every reset; a script reply from an older epoch is dropped
    #[getter(skip)]
    epoch: u64,
}

impl PipelineState {
    /// Current phase.
    pub fn phase(&self) -> PipelinePhase {
        self.machine.phase()
    }

    /// True if `group_id` is the item a running batch is generating.
    pub fn is_busy(&self, group_id: GroupId) -> bool {
        self.generating_group == Some(group_id)
    }

    /// Group ids of the bundle that have no result yet.
    pub fn pending_groups(&self) -> Vec<GroupId> {
        self.bundle
            .as_ref()
            .map(|bundle| {
                bundle
                    .group_ids()
                    .into_iter()
                    .filter(|id| !self.prompts.contains_key(id))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Applies a command to the state, publishing a phase change if any.
fn transition(
    state: &mut PipelineState,
    events: &broadcast::Sender<PipelineEvent>,
    command: PhaseCommand,
) -> Result<(), PipelineError> {
    let transition = state.machine.apply(command)?;
    if transition.changed() {
        let _ = events.send(PipelineEvent::PhaseChanged {
            from: transition.from,
            to: transition.to,
        });
    }
    Ok(())
}

fn prompt_jobs(bundle: &ScriptBundle, ids: &[GroupId]) -> Result<Vec<PromptJob>, EditError> {
    ids.iter()
        .map(|id| {
            let group = bundle
                .group(*id)
                .ok_or_else(|| EditError::new(EditErrorKind::UnknownGroup(*id)))?;
            Ok(PromptJob {
                group: group.clone(),
                shots: bundle.shots_for_group(*id)?.to_vec(),
                settings: bundle.settings.clone(),
            })
        })
        .collect()
}

/// Writes batch progress and results into shared state as they happen.
struct StateObserver<'a> {
    state: &'a RwLock<PipelineState>,
    events: &'a broadcast::Sender<PipelineEvent>,
}

#[async_trait]
impl<'a> QueueObserver<PromptResult> for StateObserver<'a> {
    async fn item_started(&self, group_id: GroupId) {
        {
            let mut state = self.state.write().await;
            state.active_group = Some(group_id);
            state.generating_group = Some(group_id);
        }
        let _ = self.events.send(PipelineEvent::ItemStarted(group_id));
    }

    async fn item_succeeded(&self, group_id: GroupId, result: &PromptResult) {
        {
            let mut state = self.state.write().await;
            state.prompts.insert(group_id, result.clone());
            state.generating_group = None;
        }
        let _ = self.events.send(PipelineEvent::ItemSucceeded(group_id));
    }

    async fn item_failed(&self, group_id: GroupId, error: &str) {
        self.state.write().await.generating_group = None;
        let _ = self.events.send(PipelineEvent::ItemFailed {
            group_id,
            message: error.to_string(),
        });
    }

    async fn progress(&self, progress: Option<BatchProgress>) {
        self.state.write().await.progress = progress;
        let _ = self.events.send(PipelineEvent::Progress(progress));
    }
}

/// Two-stage storyboard pipeline over a [`Studio`].
///
/// Commands take `&self`; share the pipeline with `Arc` to read state or
/// edit finished groups while a batch run is in flight. State locks are
/// never held across a studio call.
pub struct Pipeline<S> {
    studio: S,
    queue: GenerationQueue,
    state: RwLock<PipelineState>,
    events: broadcast::Sender<PipelineEvent>,
}

impl<S: Studio> Pipeline<S> {
    /// Create an idle pipeline.
    pub fn new(studio: S, queue: GenerationQueue) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            studio,
            queue,
            state: RwLock::new(PipelineState::default()),
            events,
        }
    }

    /// The studio used for generation.
    pub fn studio(&self) -> &S {
        &self.studio
    }

    /// Subscribe to pipeline events.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    /// Clone of the current state.
    pub async fn snapshot(&self) -> PipelineState {
        self.state.read().await.clone()
    }

    /// Current phase.
    pub async fn phase(&self) -> PipelinePhase {
        self.state.read().await.phase()
    }

    /// Current batch progress, present only during a run.
    pub async fn progress(&self) -> Option<BatchProgress> {
        self.state.read().await.progress
    }

    /// Generate a script from a brief.
    ///
    /// The brief is validated before any call. On failure the pipeline
    /// returns to `Idle`, records the message and returns the error.
    ///
    /// A reset while the studio is working abandons the attempt: the late
    /// reply is dropped and [`PipelineErrorKind::ScriptDiscarded`] returned.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad brief, a pipeline error outside
    /// `Idle`, or the generation/sanitization error that ended the attempt.
    #[instrument(skip(self, brief))]
    pub async fn submit_brief(&self, brief: &str, shot_count: usize) -> ShotlistResult<()> {
        validate_brief(brief, shot_count)?;
        let epoch = {
            let mut state = self.state.write().await;
            transition(&mut state, &self.events, PhaseCommand::SubmitBrief)?;
            state.last_error = None;
            state.epoch
        };

        let generated = match self.studio.generate_script(brief, shot_count).await {
            Ok(bundle) => check_script(&bundle, shot_count)
                .map(|_| bundle)
                .map_err(Into::into),
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            debug!(succeeded = generated.is_ok(), "Script reply arrived after a reset");
            return Err(PipelineError::new(PipelineErrorKind::ScriptDiscarded).into());
        }
        match generated {
            Ok(bundle) => {
                info!(shots = bundle.script.len(), groups = bundle.groups.len(), "Script generated");
                state.bundle = Some(bundle);
                state.prompts.clear();
                state.active_group = None;
                transition(&mut state, &self.events, PhaseCommand::ScriptGenerated)?;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Script generation failed");
                state.last_error = Some(e.to_string());
                let _ = self.events.send(PipelineEvent::Error(e.to_string()));
                transition(&mut state, &self.events, PhaseCommand::ScriptFailed)?;
                Err(e)
            }
        }
    }

    /// Load an externally supplied bundle, replacing any current work.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the groups do not partition the script,
    /// or a pipeline error during generation.
    #[instrument(skip_all, fields(shots = bundle.script.len()))]
    pub async fn import_bundle(&self, bundle: ScriptBundle) -> ShotlistResult<()> {
        bundle.validate()?;
        let mut state = self.state.write().await;
        state.machine.next(PhaseCommand::ImportBundle)?;
        state.bundle = Some(bundle);
        state.prompts.clear();
        state.active_group = None;
        state.last_error = None;
        transition(&mut state, &self.events, PhaseCommand::ImportBundle)?;
        Ok(())
    }

    /// Load a snapshot, keeping its prompt results.
    ///
    /// # Errors
    ///
    /// As [`Pipeline::import_bundle`], plus results that do not match a group.
    #[instrument(skip_all)]
    pub async fn import_snapshot(&self, snapshot: Snapshot) -> ShotlistResult<()> {
        snapshot.validate()?;
        let (bundle, prompts) = snapshot.into_parts();
        let mut state = self.state.write().await;
        state.machine.next(PhaseCommand::ImportBundle)?;
        state.bundle = Some(bundle);
        state.prompts = prompts;
        state.active_group = None;
        state.last_error = None;
        transition(&mut state, &self.events, PhaseCommand::ImportBundle)?;
        Ok(())
    }

    /// Export the bundle and results.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineErrorKind::NoBundle`] if nothing is loaded.
    pub async fn export_snapshot(&self) -> ShotlistResult<Snapshot> {
        let state = self.state.read().await;
        let bundle = state
            .bundle
            .as_ref()
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::NoBundle))?;
        Ok(Snapshot::capture(bundle, &state.prompts))
    }

    /// Confirm the reviewed script and generate prompts for every group
    /// that has none.
    ///
    /// With nothing pending the pipeline moves straight to
    /// `ReviewingPrompts` without a run.
    ///
    /// # Errors
    ///
    /// Returns a pipeline error outside `ReviewingScript`. Per-group failures
    /// are reported in the [`RunReport`], not as errors.
    #[instrument(skip(self))]
    pub async fn confirm_script(&self) -> ShotlistResult<RunReport> {
        let jobs = {
            let mut state = self.state.write().await;
            let pending = state.pending_groups();
            let command = PhaseCommand::ConfirmScript {
                pending: pending.len(),
            };
            state.machine.next(command)?;
            let bundle = state
                .bundle
                .as_ref()
                .ok_or_else(|| PipelineError::new(PipelineErrorKind::NoBundle))?;
            let jobs = prompt_jobs(bundle, &pending)?;
            transition(&mut state, &self.events, command)?;
            jobs
        };

        if jobs.is_empty() {
            debug!("Every group already has a result");
            return Ok(RunReport::default());
        }
        self.run_jobs(jobs).await
    }

    /// Clear every result and regenerate all groups.
    ///
    /// # Errors
    ///
    /// Returns a pipeline error outside `ReviewingPrompts`.
    #[instrument(skip(self))]
    pub async fn regenerate_all(&self) -> ShotlistResult<RunReport> {
        let jobs = {
            let mut state = self.state.write().await;
            state.machine.next(PhaseCommand::RegenerateAll)?;
            let bundle = state
                .bundle
                .as_ref()
                .ok_or_else(|| PipelineError::new(PipelineErrorKind::NoBundle))?;
            let jobs = prompt_jobs(bundle, &bundle.group_ids())?;
            state.prompts.clear();
            transition(&mut state, &self.events, PhaseCommand::RegenerateAll)?;
            jobs
        };
        self.run_jobs(jobs).await
    }

    /// Regenerate one group, keeping every other result.
    ///
    /// # Errors
    ///
    /// Returns a pipeline error outside `ReviewingPrompts`, or an edit error
    /// for an unknown group.
    #[instrument(skip(self))]
    pub async fn regenerate_group(&self, group_id: GroupId) -> ShotlistResult<RunReport> {
        let jobs = {
            let mut state = self.state.write().await;
            state.machine.next(PhaseCommand::RegenerateGroup)?;
            let bundle = state
                .bundle
                .as_ref()
                .ok_or_else(|| PipelineError::new(PipelineErrorKind::NoBundle))?;
            let jobs = prompt_jobs(bundle, &[group_id])?;
            transition(&mut state, &self.events, PhaseCommand::RegenerateGroup)?;
            jobs
        };
        self.run_jobs(jobs).await
    }

    async fn run_jobs(&self, jobs: Vec<PromptJob>) -> ShotlistResult<RunReport> {
        let observer = StateObserver {
            state: &self.state,
            events: &self.events,
        };
        let studio = &self.studio;

        let outcome: BatchOutcome<PromptResult> = self
            .queue
            .run(
                jobs,
                |job| async move {
                    let mut result = studio.generate_prompt(&job).await?;
                    result.group_id = job.group_id();
                    ShotlistResult::Ok(result)
                },
                &observer,
            )
            .await;

        let report = RunReport {
            attempted: *outcome.attempted(),
            failed: outcome.failed_groups(),
        };
        if !report.failed.is_empty() {
            warn!(failed = ?report.failed, "Some groups have no result");
        }

        let mut state = self.state.write().await;
        state.progress = None;
        state.generating_group = None;
        let _ = self.events.send(PipelineEvent::RunFinished {
            attempted: report.attempted,
            failed: report.failed.clone(),
        });
        transition(&mut state, &self.events, PhaseCommand::RunFinished)?;
        Ok(report)
    }

    /// Discard the bundle, results and selection, returning to `Idle`.
    ///
    /// Legal while a script is being generated; the pending reply is then
    /// dropped when it arrives.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineErrorKind::ResetNotConfirmed`] unless confirmed, and
    /// [`PipelineErrorKind::RunInProgress`] while prompts are generating.
    #[instrument(skip(self))]
    pub async fn reset(&self, confirmation: ResetConfirmation) -> ShotlistResult<()> {
        if confirmation != ResetConfirmation::Confirmed {
            return Err(PipelineError::new(PipelineErrorKind::ResetNotConfirmed).into());
        }
        let mut state = self.state.write().await;
        transition(&mut state, &self.events, PhaseCommand::Reset)?;
        state.bundle = None;
        state.prompts.clear();
        state.active_group = None;
        state.generating_group = None;
        state.progress = None;
        state.last_error = None;
        state.epoch += 1;
        info!("Pipeline reset");
        Ok(())
    }

    /// Highlight a group.
    ///
    /// Only moves the highlight; the item a run is generating stays busy.
    ///
    /// # Errors
    ///
    /// Returns an error if no bundle is loaded or the group does not exist.
    pub async fn select_group(&self, group_id: GroupId) -> ShotlistResult<()> {
        let mut state = self.state.write().await;
        let bundle = state
            .bundle
            .as_ref()
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::NoBundle))?;
        if bundle.group(group_id).is_none() {
            return Err(EditError::new(EditErrorKind::UnknownGroup(group_id)).into());
        }
        state.active_group = Some(group_id);
        Ok(())
    }

    /// Apply an edit to the bundle.
    ///
    /// The edit runs on a copy; it is committed only if the copy still has
    /// a valid partition.
    ///
    /// # Errors
    ///
    /// Returns the edit's own error, [`EditErrorKind::ShapeChanged`] if the
    /// edit broke the partition, or [`PipelineErrorKind::NoBundle`].
    pub async fn edit_bundle<F, R>(&self, edit: F) -> ShotlistResult<R>
    where
        F: FnOnce(&mut ScriptBundle) -> Result<R, EditError>,
    {
        let mut state = self.state.write().await;
        let bundle = state
            .bundle
            .as_mut()
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::NoBundle))?;
        let mut draft = bundle.clone();
        let value = edit(&mut draft)?;
        draft
            .validate()
            .map_err(|e| EditError::new(EditErrorKind::ShapeChanged(e.kind.to_string())))?;
        *bundle = draft;
        Ok(value)
    }

    /// Apply an edit to one group's prompt result.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineErrorKind::GroupBusy`] for the group a run is
    /// generating, [`PipelineErrorKind::MissingResult`] if the group has no
    /// result, or the edit's own error.
    pub async fn edit_prompt<F, R>(&self, group_id: GroupId, edit: F) -> ShotlistResult<R>
    where
        F: FnOnce(&mut PromptResult) -> Result<R, EditError>,
    {
        let mut state = self.state.write().await;
        if state.is_busy(group_id) {
            return Err(PipelineError::new(PipelineErrorKind::GroupBusy(group_id)).into());
        }
        let result = state
            .prompts
            .get_mut(&group_id)
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::MissingResult(group_id)))?;
        Ok(edit(result)?)
    }

    /// Ask the studio to rewrite the script, then merge the reply.
    ///
    /// # Errors
    ///
    /// Returns a pipeline error unless a script is under review, the
    /// studio's error, or an edit error if the reply cannot be merged.
    #[instrument(skip(self, instruction))]
    pub async fn refine_script(
        &self,
        instruction: &str,
        target: Option<ScriptTarget>,
    ) -> ShotlistResult<()> {
        let current = {
            let state = self.state.read().await;
            Self::require_review(&state, "refine script")?;
            state
                .bundle
                .clone()
                .ok_or_else(|| PipelineError::new(PipelineErrorKind::NoBundle))?
        };

        let refined = self.studio.refine_script(&current, instruction, target).await?;

        let mut state = self.state.write().await;
        Self::require_review(&state, "refine script")?;
        let bundle = state
            .bundle
            .as_mut()
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::NoBundle))?;
        bundle.merge_refined(&refined, target)?;
        Ok(())
    }

    /// Ask the studio to rewrite one group's prompts, then merge the reply.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineErrorKind::GroupBusy`] or
    /// [`PipelineErrorKind::MissingResult`] as for [`Pipeline::edit_prompt`],
    /// [`PipelineErrorKind::ResultChanged`] if the result was edited or
    /// regenerated while the studio was working, or the studio's error.
    #[instrument(skip(self, instruction))]
    pub async fn refine_prompt(
        &self,
        group_id: GroupId,
        instruction: &str,
        target: Option<PromptField>,
    ) -> ShotlistResult<()> {
        let current = {
            let state = self.state.read().await;
            if state.is_busy(group_id) {
                return Err(PipelineError::new(PipelineErrorKind::GroupBusy(group_id)).into());
            }
            state
                .prompts
                .get(&group_id)
                .cloned()
                .ok_or_else(|| PipelineError::new(PipelineErrorKind::MissingResult(group_id)))?
        };

        let refined = self.studio.refine_prompt(&current, instruction, target).await?;

        let mut state = self.state.write().await;
        if state.is_busy(group_id) {
            return Err(PipelineError::new(PipelineErrorKind::GroupBusy(group_id)).into());
        }
        let result = state
            .prompts
            .get_mut(&group_id)
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::MissingResult(group_id)))?;
        if *result != current {
            warn!(group_id, "Result changed during refinement; reply dropped");
            return Err(PipelineError::new(PipelineErrorKind::ResultChanged(group_id)).into());
        }
        result.merge_refined(&refined, target);
        Ok(())
    }

    /// Describe uploaded media as a brief.
    ///
    /// # Errors
    ///
    /// Returns the studio's error.
    pub async fn describe_media(&self, data: &[u8], mime_type: &str) -> ShotlistResult<String> {
        self.studio
            .analyze_media(data, mime_type, MediaPurpose::Brief)
            .await
    }

    /// Add a character or scene whose prompt is reverse-engineered from an
    /// image. Returns the new item's index.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineErrorKind::NoBundle`] or the studio's error.
    #[instrument(skip(self, data))]
    pub async fn add_setting_from_image(
        &self,
        kind: SettingKind,
        data: &[u8],
        mime_type: &str,
    ) -> ShotlistResult<usize> {
        let prompt = self
            .studio
            .analyze_media(data, mime_type, MediaPurpose::SettingPrompt)
            .await?;
        self.edit_bundle(|bundle| {
            let ordinal = bundle.settings.items(kind).len() + 1;
            let mut item = SettingItem::placeholder(kind, ordinal);
            item.prompt = prompt;
            Ok(bundle.settings.push_item(kind, item))
        })
        .await
    }

    fn require_review(state: &PipelineState, command: &str) -> Result<(), PipelineError> {
        match state.phase() {
            PipelinePhase::ReviewingScript | PipelinePhase::ReviewingPrompts => Ok(()),
            phase => Err(PipelineError::new(PipelineErrorKind::IllegalTransition {
                phase: phase.to_string(),
                command: command.to_string(),
            })),
        }
    }
}
