use crate::error::{MeshError, Result};
use crate::media::{AudioCapture, AudioPlayback};
use crate::room::discovery::discover;
use crate::room::mesh::MeshManager;
use crate::room::observer::{RoomObserver, Status};
use crate::room::registry::{RoomSnapshot, SessionRegistry};
use crate::room::session::RoomSession;
use crate::room::session_command::SessionCommand;
use crate::room::session_config::SessionConfig;
use crate::signaling::{ConnectOptions, SignalingRelay};
use huddle_core::{PeerId, RoomLabel};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Entry point for joining rooms. Every join gets a fresh relay connection
/// from the factory, a fresh identity and its own session task.
#[derive(Clone)]
pub struct MeshClient {
    relay_factory: Arc<dyn Fn() -> Arc<dyn SignalingRelay> + Send + Sync>,
    capture: Arc<dyn AudioCapture>,
    playback: Arc<dyn AudioPlayback>,
    observer: Arc<dyn RoomObserver>,
    config: SessionConfig,
}

impl MeshClient {
    pub fn new<F>(
        relay_factory: F,
        capture: Arc<dyn AudioCapture>,
        playback: Arc<dyn AudioPlayback>,
        observer: Arc<dyn RoomObserver>,
    ) -> Self
    where
        F: Fn() -> Arc<dyn SignalingRelay> + Send + Sync + 'static,
    {
        Self {
            relay_factory: Arc::new(relay_factory),
            capture,
            playback,
            observer,
            config: SessionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Normalizes `input`, acquires the microphone, registers a new identity,
    /// discovers the room and hands the result to a spawned session.
    ///
    /// Resources acquired before a failing step are released again.
    pub async fn join(&self, input: &str) -> Result<RoomHandle> {
        let room_label = RoomLabel::normalize(input)?;
        info!("Joining room '{}'", room_label);

        self.observer.on_status(&Status::RequestingCapture).await;
        let local_stream = match self.capture.acquire().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Microphone unavailable: {}", e);
                self.observer.on_status(&Status::CaptureDenied).await;
                return Err(e.into());
            }
        };

        self.observer.on_status(&Status::Connecting).await;
        let relay = (self.relay_factory)();
        let my_peer_id = PeerId::allocate(&room_label);
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();

        if let Err(e) = relay.register(&my_peer_id, transport_tx).await {
            warn!("Registration of {} failed: {}", my_peer_id, e);
            local_stream.stop();
            self.observer
                .on_status(&Status::RegistrationFailed(e.to_string()))
                .await;
            return Err(MeshError::SignalingRegistrationFailed(e));
        }
        self.observer.on_status(&Status::Registered).await;

        let discovered = match discover(&*relay, &room_label, &my_peer_id).await {
            Ok(peers) => peers,
            Err(e) => {
                self.observer.on_status(&Status::DiscoveryFailed).await;
                relay.unregister().await;
                local_stream.stop();
                return Err(e);
            }
        };

        let (command_tx, command_rx) = mpsc::channel(32);
        let mesh = MeshManager::new(
            relay,
            local_stream,
            Arc::clone(&self.playback),
            Arc::clone(&self.observer),
            ConnectOptions {
                reliable: self.config.reliable_control,
            },
        );
        let session = RoomSession::new(
            SessionRegistry::new(my_peer_id.clone(), room_label.clone()),
            mesh,
            self.config.clone(),
            command_rx,
            transport_rx,
        );
        let task = tokio::spawn(session.run(discovered));

        Ok(RoomHandle {
            peer_id: my_peer_id,
            room_label,
            command_tx,
            task,
        })
    }
}

/// A joined room. Dropping the handle leaves the room as well.
pub struct RoomHandle {
    peer_id: PeerId,
    room_label: RoomLabel,
    command_tx: mpsc::Sender<SessionCommand>,
    task: JoinHandle<()>,
}

impl RoomHandle {
    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn room_label(&self) -> &RoomLabel {
        &self.room_label
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    pub async fn mute(&self) -> Result<()> {
        self.send(SessionCommand::Mute).await
    }

    pub async fn unmute(&self) -> Result<()> {
        self.send(SessionCommand::Unmute).await
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| MeshError::SessionClosed)
    }

    /// Closes every channel and call, unregisters and stops the microphone.
    /// Leaving a session that already ended is not an error.
    pub async fn leave(self) -> Result<()> {
        let (done, rx) = oneshot::channel();
        if self
            .command_tx
            .send(SessionCommand::Leave { done })
            .await
            .is_ok()
        {
            let _ = rx.await;
        } else {
            debug!("Session of {} already finished", self.peer_id);
        }
        self.task.await.map_err(|_| MeshError::SessionClosed)
    }

    async fn send(&self, cmd: SessionCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| MeshError::SessionClosed)
    }
}
