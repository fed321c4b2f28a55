use async_trait::async_trait;
use huddle_client::room::{PeerListEntry, RoomObserver, Status};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Observer that records every status and keeps the latest peer list.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    statuses: Arc<Mutex<Vec<Status>>>,
    peer_list: Arc<Mutex<Vec<PeerListEntry>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn statuses(&self) -> Vec<Status> {
        self.statuses.lock().await.clone()
    }

    pub async fn has_status(&self, status: &Status) -> bool {
        self.statuses.lock().await.contains(status)
    }

    pub async fn last_status(&self) -> Option<Status> {
        self.statuses.lock().await.last().cloned()
    }

    /// Latest list as the UI would render it.
    pub async fn rendered_peer_list(&self) -> Vec<String> {
        self.peer_list
            .lock()
            .await
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

#[async_trait]
impl RoomObserver for RecordingObserver {
    async fn on_status(&self, status: &Status) {
        tracing::debug!("[RecordingObserver] status: {}", status);
        self.statuses.lock().await.push(status.clone());
    }

    async fn on_peer_list(&self, peers: &[PeerListEntry]) {
        *self.peer_list.lock().await = peers.to_vec();
    }
}
