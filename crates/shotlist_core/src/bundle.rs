//! The reviewable script bundle and its editing operations.

use crate::{
    CHUNK_SIZE, Group, GroupId, Settings, Shot, ShotField, group_count, range_label,
};
use serde::{Deserialize, Serialize};
use shotlist_error::{EditError, EditErrorKind, ValidationError, ValidationErrorKind};
use tracing::debug;

/// Shots, their groups and the shared settings.
///
/// `groups` must partition `script` contiguously by [`CHUNK_SIZE`];
/// [`ScriptBundle::validate`] checks this and never repairs it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptBundle {
    /// Ordered shots
    pub script: Vec<Shot>,
    /// Ordered groups
    pub groups: Vec<Group>,
    /// Shared settings
    pub settings: Settings,
}

/// Which part of a bundle a refinement replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScriptTarget {
    /// One shot by id
    Shot(u32),
    /// One group's narrative and its shots
    Group(GroupId),
    /// The settings block
    Settings,
}

impl ScriptBundle {
    /// Check shot ids and the group partition.
    ///
    /// # Errors
    ///
    /// Returns an error if shot ids are not `1..=n`, `n` is not a multiple
    /// of [`CHUNK_SIZE`], group ids are not `1..=n/CHUNK_SIZE`, or a group's
    /// `range` differs from [`range_label`] for its id.
    ///
    /// # Examples
    ///
    /// ```
    /// use shotlist_core::{Group, ScriptBundle, Shot};
    ///
    /// let shot = |id| Shot {
    ///     id,
    ///     description: String::new(),
    ///     voiceover: String::new(),
    ///     movement: String::new(),
    /// };
    /// let mut bundle = ScriptBundle {
    ///     script: (1..=8).map(shot).collect(),
    ///     groups: vec![Group::new(1, "a"), Group::new(2, "b")],
    ///     settings: Default::default(),
    /// };
    /// assert!(bundle.validate().is_ok());
    ///
    /// bundle.groups.pop();
    /// assert!(bundle.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.script.is_empty() {
            return Err(ValidationError::new(ValidationErrorKind::MalformedBundle(
                "script has no shots".to_string(),
            )));
        }
        for (index, shot) in self.script.iter().enumerate() {
            if shot.id as usize != index + 1 {
                return Err(ValidationError::new(ValidationErrorKind::ShotIds(format!(
                    "position {} holds shot {}",
                    index + 1,
                    shot.id
                ))));
            }
        }
        if self.script.len() % CHUNK_SIZE != 0 {
            return Err(ValidationError::new(ValidationErrorKind::PartitionMismatch(
                format!(
                    "{} shots cannot be split into groups of {}",
                    self.script.len(),
                    CHUNK_SIZE
                ),
            )));
        }
        let expected = group_count(self.script.len());
        if self.groups.len() != expected {
            return Err(ValidationError::new(ValidationErrorKind::PartitionMismatch(
                format!(
                    "{} shots need {} groups, found {}",
                    self.script.len(),
                    expected,
                    self.groups.len()
                ),
            )));
        }
        for (index, group) in self.groups.iter().enumerate() {
            if group.id as usize != index + 1 {
                return Err(ValidationError::new(ValidationErrorKind::PartitionMismatch(
                    format!("position {} holds group {}", index + 1, group.id),
                )));
            }
            let expected_range = range_label(group.id);
            if group.range != expected_range {
                return Err(ValidationError::new(ValidationErrorKind::PartitionMismatch(
                    format!(
                        "group {} is labelled \"{}\", expected \"{}\"",
                        group.id, group.range, expected_range
                    ),
                )));
            }
        }
        Ok(())
    }

    /// Ids of every group, in order.
    pub fn group_ids(&self) -> Vec<GroupId> {
        self.groups.iter().map(|g| g.id).collect()
    }

    /// Look up a group by id.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Shots belonging to a group, derived from its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the group does not exist or its span runs past
    /// the end of the script.
    pub fn shots_for_group(&self, id: GroupId) -> Result<&[Shot], EditError> {
        let group = self
            .group(id)
            .ok_or_else(|| EditError::new(EditErrorKind::UnknownGroup(id)))?;
        let span = group.shot_span();
        self.script
            .get(span.clone())
            .ok_or_else(|| EditError::out_of_range("script", span.end - 1, self.script.len()))
    }

    fn shot_mut(&mut self, id: u32) -> Result<&mut Shot, EditError> {
        self.script
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| EditError::new(EditErrorKind::UnknownShot(id)))
    }

    fn group_mut(&mut self, id: GroupId) -> Result<&mut Group, EditError> {
        self.groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| EditError::new(EditErrorKind::UnknownGroup(id)))
    }

    /// Replace one field of a shot.
    ///
    /// # Errors
    ///
    /// Returns an error if no shot has this id.
    pub fn update_shot(
        &mut self,
        id: u32,
        field: ShotField,
        value: impl Into<String>,
    ) -> Result<(), EditError> {
        self.shot_mut(id)?.set(field, value);
        debug!(shot_id = id, %field, "Updated shot");
        Ok(())
    }

    /// Replace a group's narrative.
    ///
    /// # Errors
    ///
    /// Returns an error if no group has this id.
    pub fn update_narrative(
        &mut self,
        id: GroupId,
        narrative: impl Into<String>,
    ) -> Result<(), EditError> {
        self.group_mut(id)?.narrative = narrative.into();
        debug!(group_id = id, "Updated group narrative");
        Ok(())
    }

    /// Merge an AI-refined copy of this bundle.
    ///
    /// With a target only that part is copied from `refined`; shot and
    /// group ids are never changed. Without a target the whole bundle is
    /// replaced, provided `refined` keeps the same shot count and a valid
    /// partition.
    ///
    /// # Errors
    ///
    /// Returns an error if the target does not exist on either side, or an
    /// untargeted refinement changes the bundle's shape.
    pub fn merge_refined(
        &mut self,
        refined: &ScriptBundle,
        target: Option<ScriptTarget>,
    ) -> Result<(), EditError> {
        match target {
            Some(ScriptTarget::Shot(id)) => {
                let source = refined
                    .script
                    .iter()
                    .find(|s| s.id == id)
                    .ok_or_else(|| EditError::new(EditErrorKind::UnknownShot(id)))?;
                let shot = self.shot_mut(id)?;
                shot.description = source.description.clone();
                shot.voiceover = source.voiceover.clone();
                shot.movement = source.movement.clone();
            }
            Some(ScriptTarget::Group(id)) => {
                let narrative = refined
                    .group(id)
                    .ok_or_else(|| EditError::new(EditErrorKind::UnknownGroup(id)))?
                    .narrative
                    .clone();
                let span = self
                    .group(id)
                    .ok_or_else(|| EditError::new(EditErrorKind::UnknownGroup(id)))?
                    .shot_span();
                let source_shots = refined.script.get(span.clone()).ok_or_else(|| {
                    EditError::new(EditErrorKind::ShapeChanged(format!(
                        "refined script lacks shots {}-{}",
                        span.start + 1,
                        span.end
                    )))
                })?;
                let length = self.script.len();
                let shots = self
                    .script
                    .get_mut(span.clone())
                    .ok_or_else(|| EditError::out_of_range("script", span.end - 1, length))?;
                for (shot, source) in shots.iter_mut().zip(source_shots) {
                    shot.description = source.description.clone();
                    shot.voiceover = source.voiceover.clone();
                    shot.movement = source.movement.clone();
                }
                self.group_mut(id)?.narrative = narrative;
            }
            Some(ScriptTarget::Settings) => {
                self.settings = refined.settings.clone();
            }
            None => {
                if refined.script.len() != self.script.len() {
                    return Err(EditError::new(EditErrorKind::ShapeChanged(format!(
                        "shot count changed from {} to {}",
                        self.script.len(),
                        refined.script.len()
                    ))));
                }
                refined
                    .validate()
                    .map_err(|e| EditError::new(EditErrorKind::ShapeChanged(e.kind.to_string())))?;
                *self = refined.clone();
            }
        }
        debug!(?target, "Merged refined script");
        Ok(())
    }
}
