use crate::error::CaptureError;
use crate::media::{AudioCapture, AudioPlayback, LocalStream, target_name};
use crate::signaling::RemoteStream;
use async_trait::async_trait;
use dashmap::DashMap;
use huddle_core::PeerId;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug)]
pub struct SimulatedStream {
    enabled: AtomicBool,
    stopped: AtomicBool,
}

impl SimulatedStream {
    fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl LocalStream for SimulatedStream {
    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Microphone stand-in that either grants every request or refuses them all.
pub struct SimulatedMicrophone {
    granted: bool,
    streams: Mutex<Vec<Arc<SimulatedStream>>>,
}

impl SimulatedMicrophone {
    pub fn granting() -> Self {
        Self {
            granted: true,
            streams: Mutex::new(Vec::new()),
        }
    }

    pub fn denying() -> Self {
        Self {
            granted: false,
            streams: Mutex::new(Vec::new()),
        }
    }

    /// Every stream handed out so far.
    pub async fn streams(&self) -> Vec<Arc<SimulatedStream>> {
        self.streams.lock().await.clone()
    }

    /// Streams acquired and not yet stopped.
    pub async fn live_streams(&self) -> usize {
        self.streams
            .lock()
            .await
            .iter()
            .filter(|s| !s.is_stopped())
            .count()
    }
}

impl Default for SimulatedMicrophone {
    fn default() -> Self {
        Self::granting()
    }
}

#[async_trait]
impl AudioCapture for SimulatedMicrophone {
    async fn acquire(&self) -> Result<Arc<dyn LocalStream>, CaptureError> {
        if !self.granted {
            return Err(CaptureError::PermissionDenied);
        }
        let stream = Arc::new(SimulatedStream::new());
        self.streams.lock().await.push(Arc::clone(&stream));
        Ok(stream)
    }
}

/// Playback that only remembers which stream is bound to which target.
#[derive(Default)]
pub struct TrackingPlayback {
    targets: DashMap<PeerId, RemoteStream>,
}

impl TrackingPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(&self, peer_id: &PeerId) -> Option<RemoteStream> {
        self.targets.get(peer_id).map(|entry| entry.value().clone())
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}

#[async_trait]
impl AudioPlayback for TrackingPlayback {
    async fn attach(&self, peer_id: &PeerId, stream: RemoteStream) {
        debug!("Binding {} to {}", stream.session, target_name(peer_id));
        self.targets.insert(peer_id.clone(), stream);
    }

    async fn detach(&self, peer_id: &PeerId) {
        if self.targets.remove(peer_id).is_some() {
            debug!("Released {}", target_name(peer_id));
        }
    }
}
