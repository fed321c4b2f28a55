use crate::model::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest label kept after normalization.
pub const MAX_ROOM_LABEL_LEN: usize = 20;

/// Normalized, human-chosen room name that scopes peer discovery.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomLabel(String);

impl RoomLabel {
    /// Trims, lowercases, drops every character outside `[a-z0-9_-]` and cuts the
    /// result to [`MAX_ROOM_LABEL_LEN`] characters.
    pub fn normalize(input: &str) -> Result<Self, ModelError> {
        let label: String = input
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_')
            .take(MAX_ROOM_LABEL_LEN)
            .collect();

        if label.is_empty() {
            return Err(ModelError::EmptyRoomLabel);
        }
        Ok(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomLabel {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl From<RoomLabel> for String {
    fn from(label: RoomLabel) -> Self {
        label.0
    }
}

impl fmt::Display for RoomLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
