use async_trait::async_trait;
use huddle_client::media::LocalStream;
use huddle_client::signaling::{ConnectOptions, ControlChannel, MediaSession};
use huddle_client::transport::TransportEvent;
use huddle_client::{MemoryRelay, RelayError, SignalingRelay};
use huddle_core::PeerId;
use std::sync::Arc;
use tokio::sync::{Barrier, mpsc};

/// Memory relay endpoint whose directory lookup waits at a shared barrier,
/// so clients that joined together all discover each other.
pub struct GatedRelay {
    inner: Arc<dyn SignalingRelay>,
    barrier: Arc<Barrier>,
}

impl GatedRelay {
    pub fn factory(
        relay: &MemoryRelay,
        barrier: Arc<Barrier>,
    ) -> impl Fn() -> Arc<dyn SignalingRelay> + Send + Sync + 'static {
        let relay = relay.clone();
        move || {
            Arc::new(GatedRelay {
                inner: Arc::new(relay.endpoint()),
                barrier: Arc::clone(&barrier),
            }) as Arc<dyn SignalingRelay>
        }
    }
}

#[async_trait]
impl SignalingRelay for GatedRelay {
    async fn register(
        &self,
        peer_id: &PeerId,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<(), RelayError> {
        self.inner.register(peer_id, events).await
    }

    async fn list_peers(&self) -> Result<Vec<PeerId>, RelayError> {
        self.barrier.wait().await;
        self.inner.list_peers().await
    }

    async fn connect(
        &self,
        peer_id: &PeerId,
        options: ConnectOptions,
    ) -> Result<Box<dyn ControlChannel>, RelayError> {
        self.inner.connect(peer_id, options).await
    }

    async fn call(
        &self,
        peer_id: &PeerId,
        stream: Arc<dyn LocalStream>,
    ) -> Result<Box<dyn MediaSession>, RelayError> {
        self.inner.call(peer_id, stream).await
    }

    async fn unregister(&self) {
        self.inner.unregister().await
    }
}
