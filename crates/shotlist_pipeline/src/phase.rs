//! Pipeline phases and their legal transitions.

use serde::{Deserialize, Serialize};
use shotlist_error::{PipelineError, PipelineErrorKind};
use tracing::debug;

/// Where the two-stage pipeline currently is.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
pub enum PipelinePhase {
    /// Nothing loaded
    #[default]
    Idle,
    /// Waiting on script generation
    GeneratingScript,
    /// Script ready for review and editing
    ReviewingScript,
    /// A batch run is producing prompt results
    GeneratingPrompts,
    /// Prompt results ready for review; re-entrant via regeneration
    ReviewingPrompts,
}

impl PipelinePhase {
    /// True while an upstream call or batch run owns the pipeline.
    pub fn is_generating(&self) -> bool {
        matches!(
            self,
            PipelinePhase::GeneratingScript | PipelinePhase::GeneratingPrompts
        )
    }
}

/// Inputs that move the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PhaseCommand {
    /// A validated brief was submitted
    SubmitBrief,
    /// Script generation returned a bundle
    ScriptGenerated,
    /// Script generation failed
    ScriptFailed,
    /// An external bundle was loaded
    ImportBundle,
    /// The reviewed script was confirmed; `pending` groups lack results
    ConfirmScript {
        /// Number of groups that still need generation
        pending: usize,
    },
    /// The batch run exhausted its work list
    RunFinished,
    /// Clear every result and regenerate all groups
    RegenerateAll,
    /// Regenerate a single group
    RegenerateGroup,
    /// Discard everything
    Reset,
}

impl PhaseCommand {
    /// Commands that start upstream work.
    fn starts_work(&self) -> bool {
        matches!(
            self,
            PhaseCommand::SubmitBrief
                | PhaseCommand::ImportBundle
                | PhaseCommand::ConfirmScript { .. }
                | PhaseCommand::RegenerateAll
                | PhaseCommand::RegenerateGroup
                | PhaseCommand::Reset
        )
    }
}

/// A phase change produced by [`PhaseMachine::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Phase before the command
    pub from: PipelinePhase,
    /// Phase after the command
    pub to: PipelinePhase,
}

impl Transition {
    /// True if the phase actually changed.
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// The pipeline's finite state machine.
///
/// ```text
/// Idle -> GeneratingScript -> ReviewingScript -> GeneratingPrompts -> ReviewingPrompts
///           |                                                           |      ^
///           +--(failure, reset)--> Idle              (regenerate) ------+      |
///                                                     GeneratingPrompts -------+
/// ```
///
/// # Examples
///
/// ```
/// use shotlist_pipeline::{PhaseCommand, PhaseMachine, PipelinePhase};
///
/// let mut machine = PhaseMachine::default();
/// machine.apply(PhaseCommand::SubmitBrief).unwrap();
/// machine.apply(PhaseCommand::ScriptFailed).unwrap();
/// assert_eq!(machine.phase(), PipelinePhase::Idle);
///
/// // Confirming is only legal while reviewing a script.
/// assert!(machine.apply(PhaseCommand::ConfirmScript { pending: 2 }).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseMachine {
    phase: PipelinePhase,
}

impl PhaseMachine {
    /// Current phase.
    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    /// Compute the phase `command` leads to without applying it.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineErrorKind::RunInProgress`] when a work-starting
    /// command arrives during generation, and
    /// [`PipelineErrorKind::IllegalTransition`] for any other command the
    /// current phase does not accept.
    pub fn next(&self, command: PhaseCommand) -> Result<PipelinePhase, PipelineError> {
        use PipelinePhase::*;

        let next = match (self.phase, command) {
            (Idle, PhaseCommand::SubmitBrief) => Some(GeneratingScript),
            (GeneratingScript, PhaseCommand::ScriptGenerated) => Some(ReviewingScript),
            (GeneratingScript, PhaseCommand::ScriptFailed) => Some(Idle),
            (Idle | ReviewingScript | ReviewingPrompts, PhaseCommand::ImportBundle) => {
                Some(ReviewingScript)
            }
            (ReviewingScript, PhaseCommand::ConfirmScript { pending: 0 }) => Some(ReviewingPrompts),
            (ReviewingScript, PhaseCommand::ConfirmScript { .. }) => Some(GeneratingPrompts),
            (GeneratingPrompts, PhaseCommand::RunFinished) => Some(ReviewingPrompts),
            (ReviewingPrompts, PhaseCommand::RegenerateAll | PhaseCommand::RegenerateGroup) => {
                Some(GeneratingPrompts)
            }
            // Batch runs are never cancelled; Reset is refused until the run ends.
            (GeneratingPrompts, PhaseCommand::Reset) => None,
            (_, PhaseCommand::Reset) => Some(Idle),
            _ => None,
        };

        next.ok_or_else(|| {
            if self.phase.is_generating() && command.starts_work() {
                PipelineError::new(PipelineErrorKind::RunInProgress)
            } else {
                PipelineError::new(PipelineErrorKind::IllegalTransition {
                    phase: self.phase.to_string(),
                    command: command.to_string(),
                })
            }
        })
    }

    /// Apply `command`, moving to the next phase.
    ///
    /// # Errors
    ///
    /// See [`PhaseMachine::next`]; the phase is unchanged on error.
    pub fn apply(&mut self, command: PhaseCommand) -> Result<Transition, PipelineError> {
        let to = self.next(command)?;
        let transition = Transition {
            from: self.phase,
            to,
        };
        self.phase = to;
        debug!(from = %transition.from, to = %transition.to, %command, "Phase transition");
        Ok(transition)
    }
}
