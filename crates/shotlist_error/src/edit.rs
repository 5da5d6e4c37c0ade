//! Errors from in-memory editing operations.

/// Specific editing failures. These are caller errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum EditErrorKind {
    /// Positional index outside a list
    #[display("Index {} out of range for {} (length {})", index, list, length)]
    IndexOutOfRange {
        /// Name of the addressed list
        list: &'static str,
        /// Requested index
        index: usize,
        /// Current list length
        length: usize,
    },
    /// No shot carries this id
    #[display("Shot {} does not exist", _0)]
    UnknownShot(u32),
    /// No group carries this id
    #[display("Group {} does not exist", _0)]
    UnknownGroup(u32),
    /// Refined structure changed something that must stay fixed
    #[display("Refinement rejected: {}", _0)]
    ShapeChanged(String),
}

/// Editing error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Edit Error: {} at line {} in {}", kind, line, file)]
pub struct EditError {
    /// The specific editing failure
    pub kind: EditErrorKind,
    /// Line number where the error was created
    pub line: u32,
    /// File where the error was created
    pub file: &'static str,
}

impl EditError {
    /// Create a new EditError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: EditErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for an out-of-range index on a named list.
    #[track_caller]
    pub fn out_of_range(list: &'static str, index: usize, length: usize) -> Self {
        Self::new(EditErrorKind::IndexOutOfRange {
            list,
            index,
            length,
        })
    }
}
