use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("room label is empty after normalization")]
    EmptyRoomLabel,

    #[error("peer id must not be empty")]
    EmptyPeerId,

    #[error("malformed control message: {0}")]
    MalformedMessage(String),
}
