use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("room id must be 1..={max} characters of [A-Za-z0-9_-], got {value:?}")]
    InvalidRoomId { value: String, max: usize },

    #[error("participant id must be 1..={max} printable characters without whitespace, got {value:?}")]
    InvalidParticipantId { value: String, max: usize },
}
