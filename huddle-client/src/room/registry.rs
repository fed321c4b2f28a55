use crate::room::slot::Slot;
use crate::signaling::{ControlChannel, MediaSession};
use huddle_core::{ControlMessage, PeerId, RoomLabel};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Absent,
    Connecting,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    Absent,
    Ringing,
    Streaming,
}

/// Everything this client owns toward one remote peer.
pub struct PeerEntry {
    pub peer_id: PeerId,
    pub control: Option<Slot<Box<dyn ControlChannel>>>,
    pub media: Option<Slot<Box<dyn MediaSession>>>,
    /// Sent over the control channel as soon as it opens.
    pub greeting: Option<ControlMessage>,
}

impl PeerEntry {
    fn new(peer_id: PeerId) -> Self {
        Self {
            peer_id,
            control: None,
            media: None,
            greeting: None,
        }
    }

    pub fn control_state(&self) -> ControlState {
        match &self.control {
            None => ControlState::Absent,
            Some(slot) if slot.is_live() => ControlState::Open,
            Some(_) => ControlState::Connecting,
        }
    }

    pub fn media_state(&self) -> MediaState {
        match &self.media {
            None => MediaState::Absent,
            Some(slot) if slot.is_live() => MediaState::Streaming,
            Some(_) => MediaState::Ringing,
        }
    }

    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }

    /// The live control channel, if any.
    pub fn open_channel(&self) -> Option<&dyn ControlChannel> {
        self.control
            .as_ref()
            .filter(|slot| slot.is_live())
            .map(|slot| &**slot.current())
    }
}

/// One line of the rendered peer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerListEntry {
    pub peer_id: PeerId,
    pub is_self: bool,
}

impl fmt::Display for PeerListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_self {
            write!(f, "(You) {}", self.peer_id)
        } else {
            write!(f, "{}", self.peer_id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEntryState {
    pub peer_id: PeerId,
    pub control: ControlState,
    pub media: MediaState,
}

/// Point-in-time copy of a room's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub my_peer_id: PeerId,
    pub room_label: RoomLabel,
    pub peers: Vec<PeerListEntry>,
    pub entries: Vec<PeerEntryState>,
}

impl RoomSnapshot {
    pub fn known_peers(&self) -> Vec<PeerId> {
        self.entries.iter().map(|e| e.peer_id.clone()).collect()
    }

    pub fn rendered(&self) -> Vec<String> {
        self.peers.iter().map(ToString::to_string).collect()
    }
}

/// Table of record for the known peer set. Nothing else adds or removes
/// peers.
pub struct SessionRegistry {
    my_peer_id: PeerId,
    room_label: RoomLabel,
    order: Vec<PeerId>,
    entries: HashMap<PeerId, PeerEntry>,
}

impl SessionRegistry {
    pub fn new(my_peer_id: PeerId, room_label: RoomLabel) -> Self {
        Self {
            my_peer_id,
            room_label,
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    pub fn my_peer_id(&self) -> &PeerId {
        &self.my_peer_id
    }

    pub fn room_label(&self) -> &RoomLabel {
        &self.room_label
    }

    /// Adds `peer_id` to the known set. Returns `false` when it was already
    /// known or is our own id.
    pub fn learn(&mut self, peer_id: &PeerId) -> bool {
        if peer_id == &self.my_peer_id || self.entries.contains_key(peer_id) {
            return false;
        }
        self.order.push(peer_id.clone());
        self.entries
            .insert(peer_id.clone(), PeerEntry::new(peer_id.clone()));
        true
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.entries.contains_key(peer_id)
    }

    pub fn entry(&self, peer_id: &PeerId) -> Option<&PeerEntry> {
        self.entries.get(peer_id)
    }

    pub fn entry_mut(&mut self, peer_id: &PeerId) -> Option<&mut PeerEntry> {
        self.entries.get_mut(peer_id)
    }

    pub fn remove(&mut self, peer_id: &PeerId) -> Option<PeerEntry> {
        let entry = self.entries.remove(peer_id)?;
        self.order.retain(|p| p != peer_id);
        Some(entry)
    }

    /// Empties the table, handing every entry back for teardown.
    pub fn drain(&mut self) -> Vec<PeerEntry> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|peer_id| self.entries.remove(&peer_id))
            .collect()
    }

    pub fn known_peers(&self) -> &[PeerId] {
        &self.order
    }

    pub fn entries(&self) -> impl Iterator<Item = &PeerEntry> {
        self.order.iter().filter_map(|p| self.entries.get(p))
    }

    /// Self first, then everyone else in arrival order.
    pub fn peer_list(&self) -> Vec<PeerListEntry> {
        std::iter::once(PeerListEntry {
            peer_id: self.my_peer_id.clone(),
            is_self: true,
        })
        .chain(self.order.iter().map(|peer_id| PeerListEntry {
            peer_id: peer_id.clone(),
            is_self: false,
        }))
        .collect()
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            my_peer_id: self.my_peer_id.clone(),
            room_label: self.room_label.clone(),
            peers: self.peer_list(),
            entries: self
                .entries()
                .map(|entry| PeerEntryState {
                    peer_id: entry.peer_id.clone(),
                    control: entry.control_state(),
                    media: entry.media_state(),
                })
                .collect(),
        }
    }
}
