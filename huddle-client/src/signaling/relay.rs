use crate::error::RelayError;
use crate::media::LocalStream;
use crate::transport::TransportEvent;
use async_trait::async_trait;
use bytes::Bytes;
use huddle_core::PeerId;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Identifies one end of a control channel or media session.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Ask the relay for ordered, retransmitted delivery.
    pub reliable: bool,
}

/// Audio received from a remote peer, ready to be bound to a playback target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub session: HandleId,
    pub from: PeerId,
}

/// Contract of the external signaling relay, seen from one registrant.
///
/// Every handle created through the relay reports its lifecycle into the event
/// queue handed over at [`SignalingRelay::register`].
#[async_trait]
pub trait SignalingRelay: Send + Sync {
    /// Resolves once the relay accepted `peer_id`.
    async fn register(
        &self,
        peer_id: &PeerId,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<(), RelayError>;

    /// Full directory of currently registered peer ids.
    async fn list_peers(&self) -> Result<Vec<PeerId>, RelayError>;

    /// Opens a control channel; `ChannelOpened` follows once it is usable.
    async fn connect(
        &self,
        peer_id: &PeerId,
        options: ConnectOptions,
    ) -> Result<Box<dyn ControlChannel>, RelayError>;

    /// Calls `peer_id` with the local audio.
    async fn call(
        &self,
        peer_id: &PeerId,
        stream: Arc<dyn LocalStream>,
    ) -> Result<Box<dyn MediaSession>, RelayError>;

    /// Drops the registration and every handle still owned by it.
    async fn unregister(&self);
}

#[async_trait]
pub trait ControlChannel: Send + Sync {
    fn id(&self) -> HandleId;

    fn remote(&self) -> &PeerId;

    fn is_open(&self) -> bool;

    async fn send(&self, payload: Bytes) -> Result<(), RelayError>;

    async fn close(&self);
}

#[async_trait]
pub trait MediaSession: Send + Sync {
    fn id(&self) -> HandleId;

    fn remote(&self) -> &PeerId;

    /// Accepts an inbound call with the local audio.
    async fn answer(&self, stream: Arc<dyn LocalStream>) -> Result<(), RelayError>;

    async fn close(&self);
}
