use huddle_core::{ErrorCode, ModelError, ParticipantId, RoomId, ServerMessage};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalingError {
    #[error("participant {participant_id} is already present in room {room_id}")]
    DuplicateParticipant {
        room_id: RoomId,
        participant_id: ParticipantId,
    },

    /// Expected race: the target left mid-negotiation. Logged, never sent to
    /// the client.
    #[error("relay target {target_id} is not in room {room_id}")]
    TargetNotFound {
        room_id: RoomId,
        target_id: ParticipantId,
    },

    #[error("connection has not joined a room")]
    NotJoined,

    #[error("connection already joined room {room_id}")]
    AlreadyJoined { room_id: RoomId },

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("invalid room: {0}")]
    InvalidRoom(String),
}

impl SignalingError {
    /// Wire code for errors the offending client is told about.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::DuplicateParticipant { .. } => Some(ErrorCode::DuplicateParticipant),
            Self::TargetNotFound { .. } => None,
            Self::NotJoined => Some(ErrorCode::NotJoined),
            Self::AlreadyJoined { .. } => Some(ErrorCode::AlreadyJoined),
            Self::InvalidMessage(_) => Some(ErrorCode::InvalidMessage),
            Self::InvalidRoom(_) => Some(ErrorCode::InvalidRoom),
        }
    }

    pub fn to_event(&self) -> Option<ServerMessage> {
        self.code()
            .map(|code| ServerMessage::error(code, self.to_string()))
    }
}

impl From<ModelError> for SignalingError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidRoomId { .. } => Self::InvalidRoom(err.to_string()),
            ModelError::InvalidParticipantId { .. } => Self::InvalidMessage(err.to_string()),
        }
    }
}
