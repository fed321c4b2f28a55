use crate::error::MeshError;
use crate::media::{AudioPlayback, LocalStream};
use crate::room::membership;
use crate::room::observer::{RoomObserver, Status};
use crate::room::registry::{PeerEntry, SessionRegistry};
use crate::room::slot::{Liveness, Release, Slot};
use crate::signaling::{
    ConnectOptions, ControlChannel, HandleId, MediaSession, RemoteStream, SignalingRelay,
};
use bytes::Bytes;
use futures::future::join_all;
use huddle_core::{ControlMessage, PeerId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Keeps one control channel and one media session per known peer and tears
/// everything of a peer down when its media session ends.
pub struct MeshManager {
    relay: Arc<dyn SignalingRelay>,
    local_stream: Arc<dyn LocalStream>,
    playback: Arc<dyn AudioPlayback>,
    observer: Arc<dyn RoomObserver>,
    options: ConnectOptions,
}

impl MeshManager {
    pub fn new(
        relay: Arc<dyn SignalingRelay>,
        local_stream: Arc<dyn LocalStream>,
        playback: Arc<dyn AudioPlayback>,
        observer: Arc<dyn RoomObserver>,
        options: ConnectOptions,
    ) -> Self {
        Self {
            relay,
            local_stream,
            playback,
            observer,
            options,
        }
    }

    pub fn local_stream(&self) -> &Arc<dyn LocalStream> {
        &self.local_stream
    }

    pub fn relay(&self) -> &Arc<dyn SignalingRelay> {
        &self.relay
    }

    pub async fn status(&self, status: Status) {
        self.observer.on_status(&status).await;
    }

    pub async fn publish_peer_list(&self, registry: &SessionRegistry) {
        self.observer.on_peer_list(&registry.peer_list()).await;
    }

    /// Opens whatever is missing toward `peer_id` (control channel and/or
    /// call). `greeting` goes out once the channel opens. A failure drops the
    /// peer and nothing else.
    pub async fn connect_peer(
        &self,
        registry: &mut SessionRegistry,
        peer_id: &PeerId,
        greeting: ControlMessage,
    ) {
        if let Err(e) = self.originate(registry, peer_id, greeting).await {
            warn!("{}", e);
            self.drop_peer(registry, peer_id, Status::PeerError(peer_id.clone()))
                .await;
        }
    }

    async fn originate(
        &self,
        registry: &mut SessionRegistry,
        peer_id: &PeerId,
        greeting: ControlMessage,
    ) -> Result<(), MeshError> {
        let Some(entry) = registry.entry(peer_id) else {
            return Ok(());
        };
        let needs_channel = entry.control.is_none();
        let needs_call = entry.media.is_none();

        if needs_channel {
            let channel = self
                .relay
                .connect(peer_id, self.options)
                .await
                .map_err(|source| MeshError::PeerSessionError {
                    peer_id: peer_id.clone(),
                    source,
                })?;
            if let Some(entry) = registry.entry_mut(peer_id) {
                entry.greeting = Some(greeting);
                entry.control = Some(Slot::new(channel.id(), channel));
            }
        }

        if needs_call {
            let session = self
                .relay
                .call(peer_id, Arc::clone(&self.local_stream))
                .await
                .map_err(|source| MeshError::PeerSessionError {
                    peer_id: peer_id.clone(),
                    source,
                })?;
            if let Some(entry) = registry.entry_mut(peer_id) {
                entry.media = Some(Slot::new(session.id(), session));
            }
        }

        info!(
            "Originated toward {} (channel: {}, call: {})",
            peer_id, needs_channel, needs_call
        );
        Ok(())
    }

    pub async fn accept_connection(
        &self,
        registry: &mut SessionRegistry,
        peer_id: &PeerId,
        channel: Box<dyn ControlChannel>,
    ) {
        if registry.learn(peer_id) {
            self.publish_peer_list(registry).await;
        }
        let Some(entry) = registry.entry_mut(peer_id) else {
            // Our own id: nothing to keep.
            channel.close().await;
            return;
        };

        let rejected = match entry.control.as_mut() {
            None => {
                entry.control = Some(Slot::new(channel.id(), channel));
                None
            }
            Some(slot) => slot.offer(channel.id(), channel),
        };
        if let Some(duplicate) = rejected {
            debug!("Closing duplicate control channel from {}", peer_id);
            duplicate.close().await;
        }
    }

    pub async fn accept_call(
        &self,
        registry: &mut SessionRegistry,
        peer_id: &PeerId,
        session: Box<dyn MediaSession>,
    ) {
        if registry.learn(peer_id) {
            self.publish_peer_list(registry).await;
        }
        let Some(entry) = registry.entry(peer_id) else {
            session.close().await;
            return;
        };
        if entry.media.as_ref().is_some_and(|slot| slot.is_live()) {
            debug!("Closing duplicate call from {}", peer_id);
            session.close().await;
            return;
        }

        if let Err(e) = session.answer(Arc::clone(&self.local_stream)).await {
            warn!("Failed to answer call from {}: {}", peer_id, e);
            session.close().await;
            if !registry.entry(peer_id).is_some_and(PeerEntry::has_media) {
                self.drop_peer(registry, peer_id, Status::PeerError(peer_id.clone()))
                    .await;
            }
            return;
        }

        let Some(entry) = registry.entry_mut(peer_id) else {
            return;
        };
        let rejected = match entry.media.as_mut() {
            None => {
                entry.media = Some(Slot::new(session.id(), session));
                None
            }
            Some(slot) => slot.offer(session.id(), session),
        };
        if let Some(duplicate) = rejected {
            debug!("Closing duplicate call from {}", peer_id);
            duplicate.close().await;
        }
    }

    pub async fn on_channel_opened(
        &self,
        registry: &mut SessionRegistry,
        peer_id: &PeerId,
        channel: HandleId,
    ) {
        let Some(entry) = registry.entry_mut(peer_id) else {
            return;
        };
        let Some(slot) = entry.control.as_mut() else {
            return;
        };

        let (greeting, discarded) = match slot.mark_live(channel) {
            Liveness::Promoted { discarded } => (entry.greeting.take(), discarded),
            Liveness::Late(late) => (None, Some(late)),
            Liveness::Unknown => return,
        };
        if let Some(duplicate) = discarded {
            debug!("Control channel race with {}: closing {}", peer_id, duplicate.id());
            duplicate.close().await;
        }

        debug!("Control channel {} to {} is open", channel, peer_id);
        if let (Some(message), Some(open)) = (greeting, entry.open_channel()) {
            send(open, &message).await;
        }
    }

    pub async fn on_channel_data(
        &self,
        registry: &mut SessionRegistry,
        peer_id: &PeerId,
        channel: HandleId,
        payload: Bytes,
    ) {
        let message = match ControlMessage::decode(&payload) {
            Ok(message) => message,
            Err(e) => {
                debug!("Ignoring payload from {}: {}", peer_id, e);
                return;
            }
        };
        debug!("Received {:?} from {}", message, peer_id);

        let outcome = membership::apply(registry, &message);
        if outcome.learned {
            info!("Learned about {} via gossip", message.peer_id());
            self.publish_peer_list(registry).await;
        }

        if let Some(reply) = outcome.reply {
            let arrival = registry
                .entry(peer_id)
                .and_then(|entry| entry.control.as_ref())
                .and_then(|slot| slot.get(channel));
            if let Some(arrival) = arrival {
                send(&**arrival, &reply).await;
            }
        }

        if outcome.originate {
            let me = registry.my_peer_id().clone();
            self.connect_peer(registry, message.peer_id(), membership::announce(&me))
                .await;
        }
    }

    /// A closed control channel clears its slot. A peer left with neither a
    /// channel nor a call is gone.
    pub async fn on_channel_closed(
        &self,
        registry: &mut SessionRegistry,
        peer_id: &PeerId,
        channel: HandleId,
    ) {
        let Some(entry) = registry.entry_mut(peer_id) else {
            return;
        };
        let Some(slot) = entry.control.as_mut() else {
            return;
        };
        match slot.release(channel) {
            Release::Emptied => {
                debug!("Control channel to {} closed", peer_id);
                entry.control = None;
                if entry.media.is_none() {
                    info!("{} closed its channel without ever calling", peer_id);
                    self.drop_peer(registry, peer_id, Status::PeerDisconnected(peer_id.clone()))
                        .await;
                }
            }
            Release::Replaced | Release::Contender => {
                debug!("Control channel {} to {} closed, another remains", channel, peer_id);
            }
            Release::Unknown => {}
        }
    }

    pub async fn on_stream(
        &self,
        registry: &mut SessionRegistry,
        peer_id: &PeerId,
        session: HandleId,
        stream: RemoteStream,
    ) {
        let Some(slot) = registry
            .entry_mut(peer_id)
            .and_then(|entry| entry.media.as_mut())
        else {
            return;
        };

        match slot.mark_live(session) {
            Liveness::Promoted { discarded } => {
                if let Some(duplicate) = discarded {
                    debug!("Call race with {}: closing {}", peer_id, duplicate.id());
                    duplicate.close().await;
                }
                self.playback.attach(peer_id, stream).await;
                info!("Audio from {} is playing", peer_id);
                self.status(Status::PeerConnected(peer_id.clone())).await;
            }
            Liveness::Late(late) => {
                debug!("Closing late duplicate call {} with {}", late.id(), peer_id);
                late.close().await;
            }
            Liveness::Unknown => {}
        }
    }

    /// Media close or error. Ending the last session of a peer removes it.
    pub async fn on_session_ended(
        &self,
        registry: &mut SessionRegistry,
        peer_id: &PeerId,
        session: HandleId,
        error: Option<String>,
    ) {
        let Some(slot) = registry
            .entry_mut(peer_id)
            .and_then(|entry| entry.media.as_mut())
        else {
            return;
        };

        match slot.release(session) {
            Release::Emptied => {
                let status = match error {
                    Some(reason) => {
                        warn!("Media session with {} failed: {}", peer_id, reason);
                        Status::PeerError(peer_id.clone())
                    }
                    None => {
                        info!("Media session with {} closed", peer_id);
                        Status::PeerDisconnected(peer_id.clone())
                    }
                };
                self.drop_peer(registry, peer_id, status).await;
            }
            Release::Replaced => {
                info!("Media session {} with {} ended, duplicate takes over", session, peer_id);
            }
            Release::Contender => {
                debug!("Duplicate media session {} with {} ended", session, peer_id);
            }
            Release::Unknown => {}
        }
    }

    /// Sends `message` over every open control channel.
    pub async fn broadcast(&self, registry: &SessionRegistry, message: &ControlMessage) {
        for entry in registry.entries() {
            if let Some(channel) = entry.open_channel() {
                send(channel, message).await;
            }
        }
    }

    pub async fn clear_peer_list(&self) {
        self.observer.on_peer_list(&[]).await;
    }

    /// Removes `peer_id` from the room and closes everything it owned.
    pub async fn drop_peer(&self, registry: &mut SessionRegistry, peer_id: &PeerId, status: Status) {
        let Some(entry) = registry.remove(peer_id) else {
            return;
        };
        self.close_entry(entry).await;
        self.publish_peer_list(registry).await;
        self.status(status).await;
    }

    /// Closes every peer without intermediate notifications.
    pub async fn close_all(&self, registry: &mut SessionRegistry) {
        for entry in registry.drain() {
            self.close_entry(entry).await;
        }
    }

    async fn close_entry(&self, entry: PeerEntry) {
        info!("Tearing down {}", entry.peer_id);
        if let Some(slot) = entry.media {
            let sessions = slot.into_handles();
            join_all(sessions.iter().map(|session| session.close())).await;
        }
        if let Some(slot) = entry.control {
            let channels = slot.into_handles();
            join_all(channels.iter().map(|channel| channel.close())).await;
        }
        self.playback.detach(&entry.peer_id).await;
    }
}

async fn send(channel: &dyn ControlChannel, message: &ControlMessage) {
    let payload = match message.encode() {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Failed to encode {:?}: {}", message, e);
            return;
        }
    };
    if let Err(e) = channel.send(payload).await {
        warn!("Failed to send {:?} to {}: {}", message, channel.remote(), e);
    }
}
