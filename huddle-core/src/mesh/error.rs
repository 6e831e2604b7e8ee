use crate::model::ParticipantId;
use thiserror::Error;

/// Failures local to one participant. None of them reach the server or
/// affect other links.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Camera or microphone could not be acquired. The participant stays in
    /// the room as chat-only.
    #[error("local media unavailable: {0}")]
    MediaUnavailable(String),

    #[error("negotiation with {remote_id} failed: {reason}")]
    NegotiationFailure {
        remote_id: ParticipantId,
        reason: String,
    },
}
