use crate::error::SignalingError;
use crate::transport::ConnectionId;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use huddle_core::{ParticipantId, RoomId};

/// Where a connection currently sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub room_id: RoomId,
    pub participant_id: ParticipantId,
}

/// Maps connections to the room and identity they joined as. Transport code
/// only ever deals in connection ids; everything else resolves through here.
#[derive(Default)]
pub struct ConnectionRegistry {
    bindings: DashMap<ConnectionId, Binding>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        participant_id: ParticipantId,
    ) -> Result<(), SignalingError> {
        match self.bindings.entry(connection_id) {
            Entry::Occupied(existing) => Err(SignalingError::AlreadyJoined {
                room_id: existing.get().room_id.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Binding {
                    room_id,
                    participant_id,
                });
                Ok(())
            }
        }
    }

    pub fn unbind(&self, connection_id: ConnectionId) -> Option<Binding> {
        self.bindings
            .remove(&connection_id)
            .map(|(_, binding)| binding)
    }

    pub fn lookup(&self, connection_id: ConnectionId) -> Option<Binding> {
        self.bindings.get(&connection_id).map(|b| b.value().clone())
    }

    pub fn is_bound(&self, connection_id: ConnectionId) -> bool {
        self.bindings.contains_key(&connection_id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
