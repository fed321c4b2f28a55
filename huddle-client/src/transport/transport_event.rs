use crate::signaling::{ControlChannel, HandleId, MediaSession, RemoteStream};
use bytes::Bytes;
use huddle_core::PeerId;

/// Everything the relay and its handles report back to a room session.
///
/// `peer_id` is always the remote side; `channel` / `session` name the local
/// handle that produced the event.
pub enum TransportEvent {
    /// A remote peer opened a control channel to us.
    IncomingConnection {
        peer_id: PeerId,
        channel: Box<dyn ControlChannel>,
    },

    /// A remote peer is calling us.
    IncomingCall {
        peer_id: PeerId,
        session: Box<dyn MediaSession>,
    },

    ChannelOpened { peer_id: PeerId, channel: HandleId },

    ChannelData {
        peer_id: PeerId,
        channel: HandleId,
        payload: Bytes,
    },

    ChannelClosed { peer_id: PeerId, channel: HandleId },

    /// Remote audio became available on a media session.
    StreamAvailable {
        peer_id: PeerId,
        session: HandleId,
        stream: RemoteStream,
    },

    SessionClosed { peer_id: PeerId, session: HandleId },

    SessionError {
        peer_id: PeerId,
        session: HandleId,
        reason: String,
    },

    /// Relay-level error not tied to a single handle.
    RelayError(String),
}
