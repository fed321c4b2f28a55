//! Shared model of the huddle room protocol: room labels, peer identities and
//! the membership gossip messages.

pub mod model;

pub use model::{ControlMessage, MAX_ROOM_LABEL_LEN, ModelError, PeerId, RoomLabel, SUFFIX_LEN};
