mod error;
mod participant;
mod room;
mod signaling;

pub use error::ModelError;
pub use participant::{ParticipantId, ParticipantInfo, normalize_display_name};
pub use room::RoomId;
pub use signaling::{
    ClientMessage, ErrorCode, IceCandidate, IceServerConfig, NoPayload, ServerMessage,
    SignalKind, SignalPayload,
};
