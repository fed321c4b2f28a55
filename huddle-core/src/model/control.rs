use crate::model::error::ModelError;
use crate::model::peer::PeerId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Membership gossip exchanged over a peer-to-peer control channel.
///
/// Wire form: `{"type": "join" | "announce", "peerId": "<id>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    /// "I exist; add me and connect back if you have not."
    Join {
        #[serde(rename = "peerId")]
        peer_id: PeerId,
    },
    /// "I exist; record me, but do not call me."
    Announce {
        #[serde(rename = "peerId")]
        peer_id: PeerId,
    },
}

impl ControlMessage {
    pub fn peer_id(&self) -> &PeerId {
        match self {
            Self::Join { peer_id } | Self::Announce { peer_id } => peer_id,
        }
    }

    pub fn encode(&self) -> Result<Bytes, ModelError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|e| ModelError::MalformedMessage(e.to_string()))
    }

    pub fn decode(data: &[u8]) -> Result<Self, ModelError> {
        serde_json::from_slice(data).map_err(|e| ModelError::MalformedMessage(e.to_string()))
    }
}
