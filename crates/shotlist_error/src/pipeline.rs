//! Orchestrator state errors.

/// Specific orchestrator failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PipelineErrorKind {
    /// Command is not legal in the current phase
    #[display("Cannot {} while {}", command, phase)]
    IllegalTransition {
        /// Current phase name
        phase: String,
        /// Attempted command
        command: String,
    },
    /// A batch run is already active
    #[display("A generation run is already in progress")]
    RunInProgress,
    /// Group is currently being generated and cannot be edited
    #[display("Group {} is being generated", _0)]
    GroupBusy(u32),
    /// Group has no prompt result to edit
    #[display("Group {} has no prompt result", _0)]
    MissingResult(u32),
    /// No script bundle is loaded
    #[display("No script bundle loaded")]
    NoBundle,
    /// Destructive reset requested without confirmation
    #[display("Reset requires explicit confirmation")]
    ResetNotConfirmed,
    /// A reset arrived while the script was being generated
    #[display("Script generation was abandoned by a reset")]
    ScriptDiscarded,
    /// The prompt result changed while a refinement was in flight
    #[display("Group {} changed while it was being refined", _0)]
    ResultChanged(u32),
}

/// Orchestrator error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific orchestrator failure
    pub kind: PipelineErrorKind,
    /// Line number where the error was created
    pub line: u32,
    /// File where the error was created
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
