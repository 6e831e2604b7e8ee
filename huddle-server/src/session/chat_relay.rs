use crate::error::SignalingError;
use crate::room::RoomTable;
use chrono::{DateTime, Utc};
use huddle_core::{ParticipantId, RoomId, ServerMessage};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_MAX_CHAT_LEN: usize = 2000;

/// Outcome of a broadcast chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub recipients: usize,
    pub timestamp: DateTime<Utc>,
}

/// Stamps chat text with the sender and server time, then broadcasts it to
/// the whole room, sender included.
#[derive(Clone)]
pub struct ChatRelay {
    rooms: Arc<RoomTable>,
    max_len: usize,
}

impl ChatRelay {
    pub fn new(rooms: Arc<RoomTable>, max_len: usize) -> Self {
        Self { rooms, max_len }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn send(
        &self,
        room_id: &RoomId,
        sender_id: &ParticipantId,
        sender_name: &str,
        text: &str,
    ) -> Result<Delivered, SignalingError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SignalingError::InvalidMessage("chat text is empty".into()));
        }
        let len = text.chars().count();
        if len > self.max_len {
            return Err(SignalingError::InvalidMessage(format!(
                "chat text is {len} characters, limit is {}",
                self.max_len
            )));
        }

        let timestamp = Utc::now();
        let msg = ServerMessage::ReceiveMessage {
            sender_id: sender_id.clone(),
            sender_name: sender_name.to_string(),
            text: text.to_string(),
            timestamp,
        };
        let recipients = self.rooms.broadcast(room_id, None, &msg);
        debug!(
            "Chat from {} in room {} delivered to {} participants",
            sender_id, room_id, recipients
        );

        Ok(Delivered {
            recipients,
            timestamp,
        })
    }
}
