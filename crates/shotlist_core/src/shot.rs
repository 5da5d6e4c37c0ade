//! Individual shots of a script.

use serde::{Deserialize, Serialize};

/// One indivisible unit of visual script content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shot {
    /// 1-based position in the script
    pub id: u32,
    /// What the camera sees
    pub description: String,
    /// Narration or dialogue over the shot
    pub voiceover: String,
    /// Camera movement
    pub movement: String,
}

/// Editable text fields of a [`Shot`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter, strum::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ShotField {
    /// [`Shot::description`]
    Description,
    /// [`Shot::voiceover`]
    Voiceover,
    /// [`Shot::movement`]
    Movement,
}

impl Shot {
    /// Replace one text field, leaving the others untouched.
    pub fn set(&mut self, field: ShotField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ShotField::Description => self.description = value,
            ShotField::Voiceover => self.voiceover = value,
            ShotField::Movement => self.movement = value,
        }
    }

    /// Read one text field.
    pub fn get(&self, field: ShotField) -> &str {
        match field {
            ShotField::Description => &self.description,
            ShotField::Voiceover => &self.voiceover,
            ShotField::Movement => &self.movement,
        }
    }
}
