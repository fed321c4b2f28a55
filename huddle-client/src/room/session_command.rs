use crate::room::registry::RoomSnapshot;
use tokio::sync::oneshot;

/// Requests from the [`RoomHandle`](crate::room::RoomHandle) to its session.
#[derive(Debug)]
pub enum SessionCommand {
    Mute,

    Unmute,

    /// Copy of the current peer set and per-peer handle states.
    Snapshot { reply: oneshot::Sender<RoomSnapshot> },

    /// Tear everything down; `done` fires once the relay registration is gone.
    Leave { done: oneshot::Sender<()> },
}
