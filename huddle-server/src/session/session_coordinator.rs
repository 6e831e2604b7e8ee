use crate::error::SignalingError;
use crate::room::{Participant, RoomSnapshot, RoomTable};
use crate::session::{ChatRelay, Delivered};
use crate::signaling::SignalingRouter;
use crate::transport::{ConnectionHandle, ConnectionId, ConnectionRegistry};
use huddle_core::{
    ClientMessage, ErrorCode, ParticipantId, ParticipantInfo, RoomId, ServerMessage,
    SignalPayload,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Glues transport events to the Room Table, Signaling Router and Chat
/// Relay. Transport code only calls [`dispatch`](Self::dispatch) and
/// [`disconnect`](Self::disconnect).
#[derive(Clone)]
pub struct SessionCoordinator {
    rooms: Arc<RoomTable>,
    registry: Arc<ConnectionRegistry>,
    router: SignalingRouter,
    chat: ChatRelay,
}

impl SessionCoordinator {
    pub fn new(rooms: Arc<RoomTable>, registry: Arc<ConnectionRegistry>, max_chat_len: usize) -> Self {
        Self {
            router: SignalingRouter::new(rooms.clone()),
            chat: ChatRelay::new(rooms.clone(), max_chat_len),
            rooms,
            registry,
        }
    }

    pub fn rooms(&self) -> &Arc<RoomTable> {
        &self.rooms
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Routes one inbound message. Errors the client caused come back to
    /// that client as an `error` event; nobody else sees them.
    pub fn dispatch(&self, handle: &ConnectionHandle, msg: ClientMessage) {
        let result = match msg {
            ClientMessage::JoinRoom {
                room_id,
                participant_id,
                display_name,
            } => self
                .join(handle, room_id, participant_id, &display_name)
                .map(|_| ()),
            ClientMessage::ChatMessage { text } => self.chat(handle.id(), &text).map(|_| ()),
            ClientMessage::LeaveRoom(_) => {
                self.leave(handle.id());
                Ok(())
            }
            signal => match signal.into_signal() {
                Ok((target_id, payload)) => self.relay(handle.id(), &target_id, payload),
                Err(other) => Err(SignalingError::InvalidMessage(format!(
                    "unroutable message: {other:?}"
                ))),
            },
        };

        if let Err(err) = result {
            self.report(handle, &err);
        }
    }

    fn report(&self, handle: &ConnectionHandle, err: &SignalingError) {
        match err.to_event() {
            Some(event) => {
                warn!("Rejected message from connection {}: {}", handle.id(), err);
                handle.send(event);
            }
            None => debug!("Connection {}: {}", handle.id(), err),
        }
    }

    /// Admits the connection's participant into `room_id`.
    ///
    /// The snapshot goes to the joiner and the arrival to everyone else
    /// while the room is held, so the two views never disagree.
    pub fn join(
        &self,
        handle: &ConnectionHandle,
        room_id: RoomId,
        participant_id: ParticipantId,
        display_name: &str,
    ) -> Result<RoomSnapshot, SignalingError> {
        if let Some(binding) = self.registry.lookup(handle.id()) {
            return Err(SignalingError::AlreadyJoined {
                room_id: binding.room_id,
            });
        }

        let participant = Participant::new(participant_id.clone(), display_name, handle.clone());
        let admission = match self.rooms.join_and(&room_id, participant, |room, admission| {
            handle.send(admission.snapshot.to_message());
            let joiner = &admission.participant.id;
            if let Some(previous) = &admission.replaced {
                room.broadcast(Some(joiner), &ServerMessage::user_disconnected(&previous.info()));
            }
            room.broadcast(Some(joiner), &ServerMessage::user_connected(&admission.participant));
        }) {
            Ok(admission) => admission,
            Err(err) => {
                warn!("Join of {} to room {} rejected: {}", participant_id, room_id, err);
                return Err(err);
            }
        };

        if let Some(previous) = &admission.replaced {
            info!(
                "Participant {} in room {} moved from connection {} to {}",
                participant_id,
                room_id,
                previous.handle.id(),
                handle.id()
            );
            self.registry.unbind(previous.handle.id());
            previous.handle.send(ServerMessage::error(
                ErrorCode::SessionReplaced,
                "this participant joined from another connection",
            ));
        }

        self.registry
            .bind(handle.id(), room_id.clone(), participant_id.clone())?;

        info!(
            "Participant {} ({}) joined room {} with {} others",
            participant_id,
            admission.participant.display_name,
            room_id,
            admission.snapshot.participants.len()
        );
        Ok(admission.snapshot)
    }

    /// Removes the connection's participant, if any. Safe to call twice.
    pub fn leave(&self, connection_id: ConnectionId) -> Option<ParticipantInfo> {
        let binding = self.registry.unbind(connection_id)?;
        let departed = self.rooms.leave_and(
            &binding.room_id,
            &binding.participant_id,
            Some(connection_id),
            |room, departed| {
                room.broadcast(None, &ServerMessage::user_disconnected(&departed.info()));
            },
        )?;

        info!(
            "Participant {} left room {}",
            departed.id, binding.room_id
        );
        Some(departed.info())
    }

    /// Transport-close path. Identical in effect to an explicit leave.
    pub fn disconnect(&self, connection_id: ConnectionId) -> Option<ParticipantInfo> {
        debug!("Connection {} closed", connection_id);
        self.leave(connection_id)
    }

    /// Forwards a signaling payload from the connection's participant.
    /// A missing target is logged by the router and otherwise swallowed.
    pub fn relay(
        &self,
        connection_id: ConnectionId,
        target_id: &ParticipantId,
        payload: SignalPayload,
    ) -> Result<(), SignalingError> {
        let binding = self
            .registry
            .lookup(connection_id)
            .ok_or(SignalingError::NotJoined)?;

        match self
            .router
            .relay(&binding.room_id, &binding.participant_id, target_id, payload)
        {
            Err(SignalingError::TargetNotFound { .. }) => Ok(()),
            other => other,
        }
    }

    pub fn chat(&self, connection_id: ConnectionId, text: &str) -> Result<Delivered, SignalingError> {
        let binding = self
            .registry
            .lookup(connection_id)
            .ok_or(SignalingError::NotJoined)?;
        let sender = self
            .rooms
            .lookup(&binding.room_id, &binding.participant_id)
            .ok_or(SignalingError::NotJoined)?;

        self.chat
            .send(&binding.room_id, &sender.id, &sender.display_name, text)
    }
}
