mod control;
mod error;
mod peer;
mod room;

pub use control::ControlMessage;
pub use error::ModelError;
pub use peer::{PeerId, SUFFIX_LEN};
pub use room::{MAX_ROOM_LABEL_LEN, RoomLabel};
