use crate::error::MeshError;
use crate::signaling::SignalingRelay;
use huddle_core::{PeerId, RoomLabel};
use tracing::{info, warn};

/// One-shot snapshot of the peers already in `room`, taken from the relay
/// directory. Self and ids of other rooms are dropped; directory order is kept.
pub async fn discover(
    relay: &dyn SignalingRelay,
    room: &RoomLabel,
    me: &PeerId,
) -> Result<Vec<PeerId>, MeshError> {
    let directory = relay.list_peers().await.map_err(|e| {
        warn!("Peer directory unavailable: {}", e);
        MeshError::DiscoveryUnavailable(e)
    })?;

    let mut peers: Vec<PeerId> = Vec::new();
    for peer_id in directory {
        if &peer_id != me && peer_id.belongs_to(room) && !peers.contains(&peer_id) {
            peers.push(peer_id);
        }
    }

    info!("Discovered {} peer(s) in room '{}'", peers.len(), room);
    Ok(peers)
}
