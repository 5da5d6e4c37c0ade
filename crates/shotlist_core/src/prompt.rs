//! Per-group image and camera prompt results.

use crate::GroupId;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// The fixed, ordered key set of an image prompt.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ImagePromptField {
    /// Shot framing
    Shot,
    /// Who or what is in frame
    Subject,
    /// Location and surroundings
    Environment,
    /// Light sources and mood
    Lighting,
    /// Lens and camera body
    Camera,
    /// Colour treatment
    ColorGrade,
    /// Artistic style
    Style,
    /// Rendering quality tags
    Quality,
}

/// Image-generation prompt split into named fields.
///
/// Every field is required when deserializing; a payload missing one is
/// rejected rather than defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePrompts {
    /// Shot framing
    pub shot: String,
    /// Who or what is in frame
    pub subject: String,
    /// Location and surroundings
    pub environment: String,
    /// Light sources and mood
    pub lighting: String,
    /// Lens and camera body
    pub camera: String,
    /// Colour treatment
    pub color_grade: String,
    /// Artistic style
    pub style: String,
    /// Rendering quality tags
    pub quality: String,
}

impl ImagePrompts {
    /// Read one field.
    pub fn get(&self, field: ImagePromptField) -> &str {
        match field {
            ImagePromptField::Shot => &self.shot,
            ImagePromptField::Subject => &self.subject,
            ImagePromptField::Environment => &self.environment,
            ImagePromptField::Lighting => &self.lighting,
            ImagePromptField::Camera => &self.camera,
            ImagePromptField::ColorGrade => &self.color_grade,
            ImagePromptField::Style => &self.style,
            ImagePromptField::Quality => &self.quality,
        }
    }

    /// Replace one field, leaving the others untouched.
    pub fn set(&mut self, field: ImagePromptField, value: impl Into<String>) {
        let value = value.into();
        let slot = match field {
            ImagePromptField::Shot => &mut self.shot,
            ImagePromptField::Subject => &mut self.subject,
            ImagePromptField::Environment => &mut self.environment,
            ImagePromptField::Lighting => &mut self.lighting,
            ImagePromptField::Camera => &mut self.camera,
            ImagePromptField::ColorGrade => &mut self.color_grade,
            ImagePromptField::Style => &mut self.style,
            ImagePromptField::Quality => &mut self.quality,
        };
        *slot = value;
    }

    /// Fields in their fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (ImagePromptField, &str)> {
        ImagePromptField::iter().map(move |field| (field, self.get(field)))
    }

    /// Fields joined into one comma-separated prompt, skipping empty ones.
    pub fn joined(&self) -> String {
        self.iter()
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Addressable part of a [`PromptResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptField {
    /// One image prompt field
    Image(ImagePromptField),
    /// The camera movement prompt
    Camera,
}

impl std::fmt::Display for PromptField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromptField::Image(field) => write!(f, "imagePrompts.{}", field),
            PromptField::Camera => write!(f, "cameraPrompts"),
        }
    }
}

/// Generated output for one group.
///
/// # Examples
///
/// ```
/// use shotlist_core::{ImagePromptField, ImagePrompts, PromptField, PromptResult};
///
/// let mut result = PromptResult::new(1, ImagePrompts::default(), "slow dolly in");
/// result.set(PromptField::Image(ImagePromptField::Lighting), "neon rain");
/// assert_eq!(result.image_prompts.lighting, "neon rain");
/// assert_eq!(result.camera_prompts, "slow dolly in");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResult {
    /// Group this result belongs to
    pub group_id: GroupId,
    /// Image-generation fields
    pub image_prompts: ImagePrompts,
    /// Camera movement text
    pub camera_prompts: String,
}

impl PromptResult {
    /// Create a result for a group.
    pub fn new(
        group_id: GroupId,
        image_prompts: ImagePrompts,
        camera_prompts: impl Into<String>,
    ) -> Self {
        Self {
            group_id,
            image_prompts,
            camera_prompts: camera_prompts.into(),
        }
    }

    /// Read one addressable field.
    pub fn get(&self, field: PromptField) -> &str {
        match field {
            PromptField::Image(field) => self.image_prompts.get(field),
            PromptField::Camera => &self.camera_prompts,
        }
    }

    /// Replace one addressable field, leaving every other field untouched.
    pub fn set(&mut self, field: PromptField, value: impl Into<String>) {
        match field {
            PromptField::Image(field) => self.image_prompts.set(field, value),
            PromptField::Camera => self.camera_prompts = value.into(),
        }
    }

    /// Merge a refined copy of this result.
    ///
    /// With a target only that field is taken from `refined`; without one
    /// every field is replaced. The group id is always kept.
    pub fn merge_refined(&mut self, refined: &PromptResult, target: Option<PromptField>) {
        match target {
            Some(field) => self.set(field, refined.get(field)),
            None => {
                self.image_prompts = refined.image_prompts.clone();
                self.camera_prompts = refined.camera_prompts.clone();
            }
        }
        tracing::debug!(group_id = self.group_id, ?target, "Merged refined prompt");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PromptResult {
        let mut prompts = ImagePrompts::default();
        for (i, field) in ImagePromptField::iter().enumerate() {
            prompts.set(field, format!("value {i}"));
        }
        PromptResult::new(3, prompts, "pan left")
    }

    #[test]
    fn field_order_is_fixed() {
        let keys: Vec<String> = ImagePromptField::iter().map(|f| f.to_string()).collect();
        assert_eq!(
            keys,
            [
                "shot",
                "subject",
                "environment",
                "lighting",
                "camera",
                "colorGrade",
                "style",
                "quality"
            ]
        );
    }

    #[test]
    fn targeted_merge_touches_one_field() {
        let mut current = sample();
        let mut refined = sample();
        refined.group_id = 99;
        refined.image_prompts.subject = "a new subject".into();
        refined.image_prompts.lighting = "ignored".into();
        refined.camera_prompts = "ignored".into();

        current.merge_refined(&refined, Some(PromptField::Image(ImagePromptField::Subject)));

        assert_eq!(current.group_id, 3);
        assert_eq!(current.image_prompts.subject, "a new subject");
        assert_eq!(current.image_prompts.lighting, "value 3");
        assert_eq!(current.camera_prompts, "pan left");
    }

    #[test]
    fn untargeted_merge_keeps_group_id() {
        let mut current = sample();
        let mut refined = PromptResult::new(7, ImagePrompts::default(), "crane up");
        refined.image_prompts.quality = "8k".into();

        current.merge_refined(&refined, None);

        assert_eq!(current.group_id, 3);
        assert_eq!(current.camera_prompts, "crane up");
        assert_eq!(current.image_prompts, refined.image_prompts);
    }

    #[test]
    fn missing_image_field_fails_to_deserialize() {
        let json = r#"{"shot":"a","subject":"b","environment":"c","lighting":"d",
            "camera":"e","colorGrade":"f","style":"g"}"#;
        assert!(serde_json::from_str::<ImagePrompts>(json).is_err());
    }

    #[test]
    fn joined_skips_empty_fields() {
        let mut prompts = ImagePrompts::default();
        prompts.shot = "wide".into();
        prompts.quality = "sharp".into();
        assert_eq!(prompts.joined(), "wide, sharp");
    }
}
