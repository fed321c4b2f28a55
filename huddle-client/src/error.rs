use huddle_core::{ModelError, PeerId};
use thiserror::Error;

/// Failures reported by a signaling relay or by one of its handles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("relay unavailable: {0}")]
    Unavailable(String),

    #[error("peer id {0} is already taken")]
    IdTaken(PeerId),

    #[error("peer {0} is not reachable")]
    PeerUnavailable(PeerId),

    #[error("call to {0} was refused")]
    CallRefused(PeerId),

    #[error("not registered with the relay")]
    NotRegistered,

    #[error("already registered as {0}")]
    AlreadyRegistered(PeerId),

    #[error("channel is closed")]
    ChannelClosed,

    #[error("media session is closed")]
    SessionClosed,
}

/// Microphone acquisition failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("microphone permission refused")]
    PermissionDenied,

    #[error("no capture device: {0}")]
    DeviceUnavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Errors surfaced to the user of a room.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("invalid room label: {0}")]
    InvalidRoomLabel(#[from] ModelError),

    #[error("microphone unavailable: {0}")]
    CaptureDenied(#[from] CaptureError),

    #[error("signaling registration failed: {0}")]
    SignalingRegistrationFailed(#[source] RelayError),

    #[error("peer discovery unavailable: {0}")]
    DiscoveryUnavailable(#[source] RelayError),

    #[error("session with {peer_id} failed: {source}")]
    PeerSessionError {
        peer_id: PeerId,
        #[source]
        source: RelayError,
    },

    #[error("room session is no longer running")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, MeshError>;
