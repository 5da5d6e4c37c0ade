//! Snapshot export/import and plain-text rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shotlist_core::{
    GroupId, ImagePromptField, PromptResult, ScriptBundle, SettingItem, Settings, Shot, Group,
};
use shotlist_error::{JsonError, ShotlistResult, ValidationError, ValidationErrorKind};
use std::collections::BTreeMap;
use std::fmt::Write;
use strum::IntoEnumIterator;
use tracing::debug;

/// Snapshot format version written by this crate.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Descriptive header of an exported snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    /// Snapshot format version
    pub version: u32,
    /// Export time
    pub exported_at: DateTime<Utc>,
    /// Number of shots in the script
    pub shot_count: usize,
    /// Number of groups
    pub group_count: usize,
}

/// A script bundle together with its prompt results.
///
/// The bundle's fields sit at the top level, so a plain bundle document
/// (no `meta`, no `prompts`) also parses as a snapshot.
///
/// # Examples
///
/// ```
/// use shotlist_pipeline::Snapshot;
///
/// let bundle = r#"{"script":[],"groups":[],"settings":{"overview":"","style":"","characters":[],"scenes":[]}}"#;
/// let snapshot = Snapshot::from_json(bundle).unwrap();
/// assert!(snapshot.meta.is_none());
/// assert!(snapshot.prompts.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Header; absent for plain bundle documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SnapshotMeta>,
    /// Ordered shots
    pub script: Vec<Shot>,
    /// Ordered groups
    pub groups: Vec<Group>,
    /// Shared settings
    pub settings: Settings,
    /// Prompt results keyed by group id
    #[serde(default)]
    pub prompts: BTreeMap<GroupId, PromptResult>,
}

impl Snapshot {
    /// Capture a bundle and its results, stamped with the current time.
    pub fn capture(bundle: &ScriptBundle, prompts: &BTreeMap<GroupId, PromptResult>) -> Self {
        Self {
            meta: Some(SnapshotMeta {
                version: SNAPSHOT_VERSION,
                exported_at: Utc::now(),
                shot_count: bundle.script.len(),
                group_count: bundle.groups.len(),
            }),
            script: bundle.script.clone(),
            groups: bundle.groups.clone(),
            settings: bundle.settings.clone(),
            prompts: prompts.clone(),
        }
    }

    /// Parse a snapshot or plain bundle document.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the document is not a bundle.
    pub fn from_json(json: &str) -> ShotlistResult<Self> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| JsonError::new(format!("Failed to parse snapshot: {}", e)))?;
        debug!(
            shots = snapshot.script.len(),
            prompts = snapshot.prompts.len(),
            "Parsed snapshot"
        );
        Ok(snapshot)
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if serialization fails.
    pub fn to_json(&self) -> ShotlistResult<String> {
        Ok(serde_json::to_string_pretty(self)
            .map_err(|e| JsonError::new(format!("Failed to serialize snapshot: {}", e)))?)
    }

    /// Check the bundle partition and that every result belongs to a group
    /// under its own id.
    ///
    /// # Errors
    ///
    /// Returns a validation error describing the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let bundle = self.bundle();
        bundle.validate()?;
        for (id, result) in &self.prompts {
            if bundle.group(*id).is_none() {
                return Err(ValidationError::new(ValidationErrorKind::MalformedBundle(
                    format!("prompt result for unknown group {}", id),
                )));
            }
            if result.group_id != *id {
                return Err(ValidationError::new(ValidationErrorKind::MalformedBundle(
                    format!("prompt result under key {} names group {}", id, result.group_id),
                )));
            }
        }
        Ok(())
    }

    /// The bundle part of the snapshot.
    pub fn bundle(&self) -> ScriptBundle {
        ScriptBundle {
            script: self.script.clone(),
            groups: self.groups.clone(),
            settings: self.settings.clone(),
        }
    }

    /// Split into bundle and results.
    pub fn into_parts(self) -> (ScriptBundle, BTreeMap<GroupId, PromptResult>) {
        (
            ScriptBundle {
                script: self.script,
                groups: self.groups,
                settings: self.settings,
            },
            self.prompts,
        )
    }
}

fn write_items(out: &mut String, heading: &str, items: &[SettingItem]) {
    let _ = writeln!(out, "{}", heading);
    if items.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for item in items {
        let _ = writeln!(out, "- {}: {}", item.name, item.description);
        if !item.prompt.is_empty() {
            let _ = writeln!(out, "  prompt: {}", item.prompt);
        }
    }
    let _ = writeln!(out);
}

/// Render settings, then every group's narrative and prompts, as text.
///
/// Image prompt fields appear in their fixed order, followed by the
/// camera prompt. Groups without a result are marked pending.
pub fn render_text(bundle: &ScriptBundle, prompts: &BTreeMap<GroupId, PromptResult>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "OVERVIEW\n{}\n", bundle.settings.overview);
    let _ = writeln!(out, "STYLE\n{}\n", bundle.settings.style);
    write_items(&mut out, "CHARACTERS", &bundle.settings.characters);
    write_items(&mut out, "SCENES", &bundle.settings.scenes);

    for group in &bundle.groups {
        let _ = writeln!(out, "GROUP {} (shots {})", group.id, group.range);
        let _ = writeln!(out, "{}", group.narrative);
        match prompts.get(&group.id) {
            Some(result) => {
                for field in ImagePromptField::iter() {
                    let _ = writeln!(out, "  {}: {}", field, result.image_prompts.get(field));
                }
                let _ = writeln!(out, "  cameraPrompts: {}", result.camera_prompts);
            }
            None => {
                let _ = writeln!(out, "  (prompts pending)");
            }
        }
        let _ = writeln!(out);
    }

    out
}
