mod memory_relay;
mod relay;

pub use memory_relay::{MemoryEndpoint, MemoryRelay, MemoryRelayConfig};
pub use relay::{
    ConnectOptions, ControlChannel, HandleId, MediaSession, RemoteStream, SignalingRelay,
};
