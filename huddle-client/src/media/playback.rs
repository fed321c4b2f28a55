use crate::signaling::RemoteStream;
use async_trait::async_trait;
use huddle_core::PeerId;

/// Output side of the audio subsystem. Targets are keyed by peer id: attaching
/// twice for the same peer reuses its target.
#[async_trait]
pub trait AudioPlayback: Send + Sync {
    async fn attach(&self, peer_id: &PeerId, stream: RemoteStream);

    async fn detach(&self, peer_id: &PeerId);
}

pub fn target_name(peer_id: &PeerId) -> String {
    format!("remote-audio-{}", peer_id)
}
