use crate::room::membership;
use crate::room::mesh::MeshManager;
use crate::room::observer::Status;
use crate::room::registry::SessionRegistry;
use crate::room::session_command::SessionCommand;
use crate::room::session_config::SessionConfig;
use crate::transport::TransportEvent;
use huddle_core::PeerId;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

/// Actor owning one joined room. Everything that touches the peer set runs on
/// this task, one command or transport event at a time.
pub struct RoomSession {
    registry: SessionRegistry,
    mesh: MeshManager,
    config: SessionConfig,
    command_rx: mpsc::Receiver<SessionCommand>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    announce_at: Option<Instant>,
}

impl RoomSession {
    pub fn new(
        registry: SessionRegistry,
        mesh: MeshManager,
        config: SessionConfig,
        command_rx: mpsc::Receiver<SessionCommand>,
        transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> Self {
        Self {
            registry,
            mesh,
            config,
            command_rx,
            transport_rx,
            announce_at: None,
        }
    }

    pub async fn run(mut self, discovered: Vec<PeerId>) {
        info!(
            "Room session for {} in '{}' started",
            self.registry.my_peer_id(),
            self.registry.room_label()
        );
        self.enter(discovered).await;

        loop {
            let announce_at = self.announce_at;
            let settle = async move {
                match announce_at {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => {
                            if !self.handle_command(c).await {
                                break;
                            }
                        }
                        None => {
                            info!("Command channel closed. Leaving room.");
                            self.leave().await;
                            break;
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    match evt {
                        Some(e) => self.handle_transport_event(e).await,
                        None => {
                            warn!("Lost the signaling relay. Leaving room.");
                            self.leave().await;
                            break;
                        }
                    }
                }

                _ = settle => {
                    self.announce_at = None;
                    self.announce().await;
                }
            }
        }

        info!("Room session finished");
    }

    /// Records the discovery snapshot and greets every peer in it with `Join`.
    async fn enter(&mut self, discovered: Vec<PeerId>) {
        for peer_id in &discovered {
            self.registry.learn(peer_id);
        }
        self.mesh.publish_peer_list(&self.registry).await;
        self.mesh.status(Status::Joined).await;

        let join = membership::join(self.registry.my_peer_id());
        for peer_id in &discovered {
            self.mesh
                .connect_peer(&mut self.registry, peer_id, join.clone())
                .await;
        }

        self.announce_at = Some(Instant::now() + self.config.settle_delay);
    }

    async fn announce(&mut self) {
        let announce = membership::announce(self.registry.my_peer_id());
        debug!(
            "Announcing {} to {} peer(s)",
            self.registry.my_peer_id(),
            self.registry.known_peers().len()
        );
        self.mesh.broadcast(&self.registry, &announce).await;
    }

    /// Returns `false` once the session is over.
    async fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::Mute => {
                self.mesh.local_stream().set_enabled(false);
                self.mesh.status(Status::Muted).await;
            }

            SessionCommand::Unmute => {
                self.mesh.local_stream().set_enabled(true);
                self.mesh.status(Status::Unmuted).await;
            }

            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.registry.snapshot());
            }

            SessionCommand::Leave { done } => {
                self.leave().await;
                let _ = done.send(());
                return false;
            }
        }
        true
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        let registry = &mut self.registry;
        match event {
            TransportEvent::IncomingConnection { peer_id, channel } => {
                debug!("Incoming control channel {} from {}", channel.id(), peer_id);
                self.mesh
                    .accept_connection(registry, &peer_id, channel)
                    .await;
            }

            TransportEvent::IncomingCall { peer_id, session } => {
                debug!("Incoming call {} from {}", session.id(), peer_id);
                self.mesh.accept_call(registry, &peer_id, session).await;
            }

            TransportEvent::ChannelOpened { peer_id, channel } => {
                self.mesh
                    .on_channel_opened(registry, &peer_id, channel)
                    .await;
            }

            TransportEvent::ChannelData {
                peer_id,
                channel,
                payload,
            } => {
                self.mesh
                    .on_channel_data(registry, &peer_id, channel, payload)
                    .await;
            }

            TransportEvent::ChannelClosed { peer_id, channel } => {
                self.mesh
                    .on_channel_closed(registry, &peer_id, channel)
                    .await;
            }

            TransportEvent::StreamAvailable {
                peer_id,
                session,
                stream,
            } => {
                self.mesh
                    .on_stream(registry, &peer_id, session, stream)
                    .await;
            }

            TransportEvent::SessionClosed { peer_id, session } => {
                self.mesh
                    .on_session_ended(registry, &peer_id, session, None)
                    .await;
            }

            TransportEvent::SessionError {
                peer_id,
                session,
                reason,
            } => {
                self.mesh
                    .on_session_ended(registry, &peer_id, session, Some(reason))
                    .await;
            }

            TransportEvent::RelayError(reason) => {
                warn!("Relay error: {}", reason);
                self.mesh.status(Status::RelayError(reason)).await;
            }
        }
    }

    async fn leave(&mut self) {
        info!(
            "{} leaving room '{}'",
            self.registry.my_peer_id(),
            self.registry.room_label()
        );
        self.announce_at = None;

        self.mesh.close_all(&mut self.registry).await;
        self.mesh.relay().unregister().await;
        self.mesh.local_stream().stop();

        self.mesh.clear_peer_list().await;
        self.mesh.status(Status::Idle).await;
    }
}
