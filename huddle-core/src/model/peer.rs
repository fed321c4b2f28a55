use crate::model::error::ModelError;
use crate::model::room::RoomLabel;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters of the random part of a [`PeerId`]. Contains no `-`, so the last
/// `-` of an id always separates the room prefix from the suffix.
const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
pub const SUFFIX_LEN: usize = 6;

/// Relay-wide peer identifier of the form `<room>-<suffix>`.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerId(String);

impl PeerId {
    /// Allocates a fresh id inside `room`.
    pub fn allocate(room: &RoomLabel) -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from(SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())]))
            .collect();
        Self(format!("{}-{}", room, suffix))
    }

    /// Accepts any non-empty id, as listed by the relay directory.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        if s.is_empty() {
            return Err(ModelError::EmptyPeerId);
        }
        Ok(Self(s.to_owned()))
    }

    /// Part before the last `-`, or `None` for ids that were not allocated
    /// inside a room.
    pub fn room_prefix(&self) -> Option<&str> {
        match self.0.rsplit_once('-') {
            Some((prefix, suffix)) if !prefix.is_empty() && !suffix.is_empty() => Some(prefix),
            _ => None,
        }
    }

    pub fn belongs_to(&self, room: &RoomLabel) -> bool {
        self.room_prefix() == Some(room.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PeerId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(ModelError::EmptyPeerId);
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for PeerId {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PeerId> for String {
    fn from(id: PeerId) -> Self {
        id.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
