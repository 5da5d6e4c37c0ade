//! Fixed-size shot groups.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Number of shots in every group.
pub const CHUNK_SIZE: usize = 4;

/// Group identifier (1-based, contiguous within a bundle).
pub type GroupId = u32;

/// A contiguous chunk of shots generated as one prompt unit.
///
/// Membership is derived from `id` alone; see [`shot_span`].
///
/// # Examples
///
/// ```
/// use shotlist_core::Group;
///
/// let group = Group::new(2, "The chase reaches the docks");
/// assert_eq!(group.range, "5-8");
/// assert_eq!(group.shot_span(), 4..8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group id
    pub id: GroupId,
    /// Human-readable span of 1-based shot numbers, e.g. "1-4"
    pub range: String,
    /// What happens across the group's shots
    pub narrative: String,
}

impl Group {
    /// Create a group with the canonical range label for its id.
    pub fn new(id: GroupId, narrative: impl Into<String>) -> Self {
        Self {
            id,
            range: range_label(id),
            narrative: narrative.into(),
        }
    }

    /// Zero-based shot indices belonging to this group.
    pub fn shot_span(&self) -> Range<usize> {
        shot_span(self.id)
    }
}

/// Zero-based shot indices `[(id-1)*4, (id-1)*4 + 4)` for a group id.
///
/// Group ids start at 1; an id of 0 yields an empty span.
pub fn shot_span(id: GroupId) -> Range<usize> {
    if id == 0 {
        return 0..0;
    }
    let start = (id as usize - 1) * CHUNK_SIZE;
    start..start + CHUNK_SIZE
}

/// Canonical 1-based range label for a group id, e.g. `"5-8"` for id 2.
pub fn range_label(id: GroupId) -> String {
    let span = shot_span(id);
    format!("{}-{}", span.start + 1, span.end)
}

/// Number of groups a script of `shot_count` shots is split into.
pub fn group_count(shot_count: usize) -> usize {
    shot_count / CHUNK_SIZE
}
