//! Join / Announce gossip.
//!
//! A newly joined client sends `Join` to every peer of its discovery snapshot;
//! receivers answer with `Announce` and call back only when they have no media
//! session with the sender yet. After the settle delay the newcomer broadcasts
//! `Announce` to everyone it has an open channel with. Applying a message is
//! idempotent, so duplicates and reordering are harmless.

use crate::room::registry::SessionRegistry;
use huddle_core::{ControlMessage, PeerId};

/// What the mesh has to do after a message was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The subject was not known before.
    pub learned: bool,
    /// Open a channel and call the subject.
    pub originate: bool,
    /// Send this back over the channel the message arrived on.
    pub reply: Option<ControlMessage>,
}

impl Outcome {
    fn ignored() -> Self {
        Self {
            learned: false,
            originate: false,
            reply: None,
        }
    }
}

pub fn join(me: &PeerId) -> ControlMessage {
    ControlMessage::Join {
        peer_id: me.clone(),
    }
}

pub fn announce(me: &PeerId) -> ControlMessage {
    ControlMessage::Announce {
        peer_id: me.clone(),
    }
}

/// Applies `message` to the known set and decides the follow-up.
pub fn apply(registry: &mut SessionRegistry, message: &ControlMessage) -> Outcome {
    let subject = message.peer_id();
    if subject == registry.my_peer_id() {
        return Outcome::ignored();
    }

    let learned = registry.learn(subject);

    match message {
        ControlMessage::Join { .. } => Outcome {
            learned,
            originate: !registry.entry(subject).is_some_and(|e| e.has_media()),
            reply: Some(announce(registry.my_peer_id())),
        },
        ControlMessage::Announce { .. } => Outcome {
            learned,
            originate: false,
            reply: None,
        },
    }
}
