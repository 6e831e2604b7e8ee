use crate::error::SignalingError;
use crate::room::RoomTable;
use huddle_core::{ParticipantId, RoomId, SignalPayload};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves relay targets and forwards offer/answer/candidate payloads,
/// tagged with the sender. Payload contents are never inspected.
#[derive(Clone)]
pub struct SignalingRouter {
    rooms: Arc<RoomTable>,
}

impl SignalingRouter {
    pub fn new(rooms: Arc<RoomTable>) -> Self {
        Self { rooms }
    }

    /// Delivers `payload` to `target_id` if it is still in the room.
    ///
    /// A missing target (or a sender that already left) is an expected race
    /// and yields `TargetNotFound` without touching any other participant.
    pub fn relay(
        &self,
        room_id: &RoomId,
        sender_id: &ParticipantId,
        target_id: &ParticipantId,
        payload: SignalPayload,
    ) -> Result<(), SignalingError> {
        let kind = payload.kind();
        let not_found = || SignalingError::TargetNotFound {
            room_id: room_id.clone(),
            target_id: target_id.clone(),
        };

        let Some(sender) = self.rooms.lookup(room_id, sender_id) else {
            warn!(
                "Dropping {} from {} in room {}: sender no longer present",
                kind, sender_id, room_id
            );
            return Err(not_found());
        };

        let Some(target) = self.rooms.lookup(room_id, target_id) else {
            warn!(
                "Dropping {} from {} to {} in room {}: target not found",
                kind, sender_id, target_id, room_id
            );
            return Err(not_found());
        };

        debug!("Relaying {} {} -> {}", kind, sender_id, target_id);
        if !target.handle.send(payload.into_server_message(&sender.info())) {
            warn!(
                "Dropping {} from {} to {}: target connection closed",
                kind, sender_id, target_id
            );
            return Err(not_found());
        }

        Ok(())
    }
}
