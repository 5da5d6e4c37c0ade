//! Shared world settings: overview, style, characters and scenes.

use serde::{Deserialize, Serialize};
use shotlist_error::EditError;
use tracing::debug;

/// A character or scene reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingItem {
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Image-generation prompt for this item
    pub prompt: String,
}

/// Which list of [`Settings`] an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SettingKind {
    /// [`Settings::characters`]
    Character,
    /// [`Settings::scenes`]
    Scene,
}

/// Editable text fields of a [`SettingItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SettingField {
    /// [`SettingItem::name`]
    Name,
    /// [`SettingItem::description`]
    Description,
    /// [`SettingItem::prompt`]
    Prompt,
}

impl SettingItem {
    /// Placeholder content for a freshly added item.
    pub fn placeholder(kind: SettingKind, ordinal: usize) -> Self {
        let name = match kind {
            SettingKind::Character => format!("New character {}", ordinal),
            SettingKind::Scene => format!("New scene {}", ordinal),
        };
        Self {
            name,
            description: String::new(),
            prompt: String::new(),
        }
    }

    /// Replace one text field.
    pub fn set(&mut self, field: SettingField, value: impl Into<String>) {
        let value = value.into();
        match field {
            SettingField::Name => self.name = value,
            SettingField::Description => self.description = value,
            SettingField::Prompt => self.prompt = value,
        }
    }
}

/// Visual style presets for [`Settings::style`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter, strum::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "title_case")]
pub enum StylePreset {
    /// Live-action film look
    Cinematic,
    /// Hand-drawn Japanese animation
    Anime,
    /// Handheld, natural light
    Documentary,
    /// High contrast black and white
    Noir,
    /// Stylized 3D animation
    Animated3d,
    /// Soft painted washes
    Watercolor,
}

impl StylePreset {
    /// Style text written into [`Settings::style`] when the preset is chosen.
    pub fn style_text(&self) -> &'static str {
        match self {
            StylePreset::Cinematic => {
                "cinematic live action, anamorphic lens, shallow depth of field, film grain"
            }
            StylePreset::Anime => "2D anime, clean line art, cel shading, vibrant palette",
            StylePreset::Documentary => "documentary realism, handheld camera, natural light",
            StylePreset::Noir => "film noir, black and white, hard shadows, low key lighting",
            StylePreset::Animated3d => "stylized 3D animation, soft global illumination",
            StylePreset::Watercolor => "watercolor illustration, soft edges, paper texture",
        }
    }
}

/// World, style, character and scene reference shared by every group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Story overview
    pub overview: String,
    /// Visual style
    pub style: String,
    /// Characters, in insertion order
    pub characters: Vec<SettingItem>,
    /// Scenes, in insertion order
    pub scenes: Vec<SettingItem>,
}

/// Partial update of [`Settings`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    /// Replacement overview
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Replacement style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Replacement character list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<Vec<SettingItem>>,
    /// Replacement scene list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenes: Option<Vec<SettingItem>>,
}

impl Settings {
    /// Items of one kind.
    pub fn items(&self, kind: SettingKind) -> &[SettingItem] {
        match kind {
            SettingKind::Character => &self.characters,
            SettingKind::Scene => &self.scenes,
        }
    }

    fn items_mut(&mut self, kind: SettingKind) -> &mut Vec<SettingItem> {
        match kind {
            SettingKind::Character => &mut self.characters,
            SettingKind::Scene => &mut self.scenes,
        }
    }

    fn list_name(kind: SettingKind) -> &'static str {
        match kind {
            SettingKind::Character => "characters",
            SettingKind::Scene => "scenes",
        }
    }

    /// Append a placeholder item and return its index.
    ///
    /// # Examples
    ///
    /// ```
    /// use shotlist_core::{SettingKind, Settings};
    ///
    /// let mut settings = Settings::default();
    /// let index = settings.add_item(SettingKind::Scene);
    /// assert_eq!(index, 0);
    /// assert_eq!(settings.scenes[0].name, "New scene 1");
    /// ```
    pub fn add_item(&mut self, kind: SettingKind) -> usize {
        let items = self.items_mut(kind);
        items.push(SettingItem::placeholder(kind, items.len() + 1));
        debug!(%kind, index = items.len() - 1, "Added setting item");
        items.len() - 1
    }

    /// Append a fully formed item (e.g. from image analysis) and return its index.
    pub fn push_item(&mut self, kind: SettingKind, item: SettingItem) -> usize {
        let items = self.items_mut(kind);
        items.push(item);
        items.len() - 1
    }

    /// Replace one field of the item at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn update_item(
        &mut self,
        kind: SettingKind,
        index: usize,
        field: SettingField,
        value: impl Into<String>,
    ) -> Result<(), EditError> {
        let items = self.items_mut(kind);
        let length = items.len();
        let item = items
            .get_mut(index)
            .ok_or_else(|| EditError::out_of_range(Self::list_name(kind), index, length))?;
        item.set(field, value);
        debug!(%kind, index, %field, "Updated setting item");
        Ok(())
    }

    /// Remove the item at `index`. Later items shift down by one.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn remove_item(&mut self, kind: SettingKind, index: usize) -> Result<SettingItem, EditError> {
        let items = self.items_mut(kind);
        if index >= items.len() {
            return Err(EditError::out_of_range(
                Self::list_name(kind),
                index,
                items.len(),
            ));
        }
        debug!(%kind, index, "Removed setting item");
        Ok(items.remove(index))
    }

    /// Apply a style preset.
    pub fn apply_preset(&mut self, preset: StylePreset) {
        self.style = preset.style_text().to_string();
    }

    /// Merge a partial update, leaving unspecified fields untouched.
    pub fn merge(&mut self, patch: SettingsPatch) {
        if let Some(overview) = patch.overview {
            self.overview = overview;
        }
        if let Some(style) = patch.style {
            self.style = style;
        }
        if let Some(characters) = patch.characters {
            self.characters = characters;
        }
        if let Some(scenes) = patch.scenes {
            self.scenes = scenes;
        }
    }
}
