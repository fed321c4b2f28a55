//! Room membership and full-mesh audio formation on top of a signaling relay.
//!
//! A [`MeshClient`] joins a room by allocating a room-prefixed identity,
//! registering it with the relay and discovering the peers already present.
//! From there a per-room actor gossips `Join`/`Announce` over peer-to-peer
//! control channels and keeps one media session per remote peer.

pub mod error;
pub mod media;
pub mod room;
pub mod signaling;
pub mod transport;

pub use error::{CaptureError, ConfigError, MeshError, RelayError, Result};
pub use room::{MeshClient, RoomHandle, RoomObserver, RoomSnapshot, SessionConfig, Status};
pub use signaling::{MemoryRelay, MemoryRelayConfig, SignalingRelay};
