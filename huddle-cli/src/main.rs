use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::*;
use huddle_client::media::{SimulatedMicrophone, TrackingPlayback};
use huddle_client::room::PeerListEntry;
use huddle_client::{
    MemoryRelay, MemoryRelayConfig, MeshClient, RoomHandle, RoomObserver, SessionConfig,
    SignalingRelay, Status,
};
use huddle_core::{PeerId, RoomLabel};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "Room membership and mesh formation playground")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the normalized room label and a freshly allocated peer id.
    Normalize { input: String },

    /// Runs several clients in one process against an in-memory relay.
    Simulate {
        #[arg(short, long, default_value = "Team Room!")]
        room: String,

        #[arg(short, long, default_value_t = 3)]
        peers: usize,

        /// Overrides HUDDLE_SETTLE_DELAY_MS.
        #[arg(long)]
        settle_ms: Option<u64>,

        /// Overrides HUDDLE_LIVENESS_TIMEOUT_MS.
        #[arg(long)]
        liveness_ms: Option<u64>,

        /// Cut the last client off the relay and watch the others notice.
        #[arg(long)]
        sever: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match Cli::parse().command {
        Commands::Normalize { input } => {
            let label = RoomLabel::normalize(&input)
                .with_context(|| format!("'{}' has no usable characters", input))?;
            println!("{} {}", "Room label:".cyan(), label.as_str().bold());
            println!("{} {}", "Peer id:   ".cyan(), PeerId::allocate(&label));
        }

        Commands::Simulate {
            room,
            peers,
            settle_ms,
            liveness_ms,
            sever,
        } => {
            let mut session_config =
                SessionConfig::from_env().context("Invalid session configuration")?;
            if let Some(ms) = settle_ms {
                session_config.settle_delay = Duration::from_millis(ms);
            }
            let mut relay_config =
                MemoryRelayConfig::from_env().context("Invalid relay configuration")?;
            if let Some(ms) = liveness_ms {
                relay_config.liveness_timeout = Duration::from_millis(ms);
            }

            simulate(&room, peers, session_config, relay_config, sever).await?;
        }
    }

    Ok(())
}

async fn simulate(
    room: &str,
    peers: usize,
    session_config: SessionConfig,
    relay_config: MemoryRelayConfig,
    sever: bool,
) -> Result<()> {
    println!(
        "{}",
        format!("🚀 Simulating {} clients in '{}'...", peers, room)
            .green()
            .bold()
    );

    let settle = session_config.settle_delay;
    let liveness = relay_config.liveness_timeout;
    let relay = MemoryRelay::new(relay_config);

    let mut handles = Vec::with_capacity(peers);
    for n in 1..=peers {
        let endpoints = relay.clone();
        let client = MeshClient::new(
            move || Arc::new(endpoints.endpoint()) as Arc<dyn SignalingRelay>,
            Arc::new(SimulatedMicrophone::granting()),
            Arc::new(TrackingPlayback::new()),
            Arc::new(ConsoleObserver { client: n }),
        )
        .with_config(session_config.clone());

        let handle = client
            .join(room)
            .await
            .with_context(|| format!("Client {} failed to join", n))?;
        handles.push(handle);
    }

    tokio::time::sleep(settle * 2 + Duration::from_millis(100)).await;
    println!("{}", "📋 Peer lists after joining:".cyan());
    print_peer_lists(&handles).await?;

    if sever && handles.len() > 1 {
        if let Some(severed) = handles.pop() {
            println!(
                "{}",
                format!("✂️  Severing {} from the relay...", severed.peer_id()).yellow()
            );
            relay.sever(severed.peer_id());

            tokio::time::sleep(liveness + settle + Duration::from_millis(100)).await;
            println!("{}", "📋 Peer lists after the liveness timeout:".cyan());
            print_peer_lists(&handles).await?;
            severed.leave().await.context("Severed client failed to stop")?;
        }
    }

    for handle in handles {
        let peer_id = handle.peer_id().clone();
        handle
            .leave()
            .await
            .with_context(|| format!("{} failed to leave", peer_id))?;
    }

    println!("{}", "✨ Simulation finished.".green().bold());
    Ok(())
}

async fn print_peer_lists(handles: &[RoomHandle]) -> Result<()> {
    for handle in handles {
        let snapshot = handle
            .snapshot()
            .await
            .with_context(|| format!("{} is no longer running", handle.peer_id()))?;
        println!("   {}", snapshot.rendered().join(", "));
    }
    Ok(())
}

/// Prints every status change, prefixed with the client number.
struct ConsoleObserver {
    client: usize,
}

#[async_trait]
impl RoomObserver for ConsoleObserver {
    async fn on_status(&self, status: &Status) {
        let prefix = format!("[{}]", self.client).dimmed();
        let line = status.to_string();
        match status {
            Status::Idle => {}
            Status::CaptureDenied
            | Status::RegistrationFailed(_)
            | Status::DiscoveryFailed
            | Status::PeerError(_)
            | Status::RelayError(_) => println!("{} {}", prefix, line.red()),
            Status::PeerDisconnected(_) => println!("{} {}", prefix, line.yellow()),
            Status::Joined | Status::PeerConnected(_) => println!("{} {}", prefix, line.green()),
            _ => println!("{} {}", prefix, line),
        }
    }

    async fn on_peer_list(&self, peers: &[PeerListEntry]) {
        tracing::debug!("client {} now lists {} peer(s)", self.client, peers.len());
    }
}
