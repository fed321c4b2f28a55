mod discovery;
mod membership;
mod mesh;
mod mesh_client;
mod observer;
mod registry;
mod session;
mod session_command;
mod session_config;
mod slot;

pub use discovery::discover;
pub use membership::{Outcome, announce, apply, join};
pub use mesh::MeshManager;
pub use mesh_client::{MeshClient, RoomHandle};
pub use observer::{RoomObserver, Status};
pub use registry::{
    ControlState, MediaState, PeerEntry, PeerEntryState, PeerListEntry, RoomSnapshot,
    SessionRegistry,
};
pub use session::RoomSession;
pub use session_command::SessionCommand;
pub use session_config::SessionConfig;
