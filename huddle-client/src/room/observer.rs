use crate::room::registry::PeerListEntry;
use async_trait::async_trait;
use huddle_core::PeerId;
use std::fmt;

/// The single status line shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Idle,
    RequestingCapture,
    CaptureDenied,
    Connecting,
    RegistrationFailed(String),
    Registered,
    DiscoveryFailed,
    Joined,
    PeerConnected(PeerId),
    PeerDisconnected(PeerId),
    PeerError(PeerId),
    RelayError(String),
    Muted,
    Unmuted,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => Ok(()),
            Status::RequestingCapture => f.write_str("Requesting microphone access..."),
            Status::CaptureDenied => f.write_str("Microphone access denied."),
            Status::Connecting => f.write_str("Connecting..."),
            Status::RegistrationFailed(reason) => write!(f, "Peer error: {}", reason),
            Status::Registered => f.write_str("Connected to signaling relay, joining room..."),
            Status::DiscoveryFailed => f.write_str("Failed to discover peers. Try again."),
            Status::Joined => f.write_str("Connected to room. Talk away!"),
            Status::PeerConnected(peer_id) => write!(f, "Connected to {}", peer_id),
            Status::PeerDisconnected(peer_id) => write!(f, "Peer {} disconnected.", peer_id),
            Status::PeerError(peer_id) => write!(f, "Voice connection error with {}", peer_id),
            Status::RelayError(reason) => write!(f, "Peer error: {}", reason),
            Status::Muted => f.write_str("Muted."),
            Status::Unmuted => f.write_str("Unmuted."),
        }
    }
}

/// User-facing surface of a room: the status line and the live peer list.
#[async_trait]
pub trait RoomObserver: Send + Sync + 'static {
    async fn on_status(&self, status: &Status);

    async fn on_peer_list(&self, peers: &[PeerListEntry]);
}
