use crate::room::Participant;
use huddle_core::{ParticipantId, ParticipantInfo, RoomId, ServerMessage};

/// Participants of a room other than the one being admitted, in arrival
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoomSnapshot {
    pub participants: Vec<ParticipantInfo>,
}

impl RoomSnapshot {
    pub fn ids(&self) -> Vec<&ParticipantId> {
        self.participants.iter().map(|p| &p.id).collect()
    }

    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::CurrentUsers {
            users: self.participants.clone(),
        }
    }
}

pub struct Room {
    id: RoomId,
    participants: Vec<Participant>,
}

impl Room {
    pub(crate) fn new(id: RoomId) -> Self {
        Self {
            id,
            participants: Vec::new(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn get(&self, participant_id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == participant_id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn snapshot_excluding(&self, participant_id: &ParticipantId) -> RoomSnapshot {
        RoomSnapshot {
            participants: self
                .participants
                .iter()
                .filter(|p| &p.id != participant_id)
                .map(Participant::info)
                .collect(),
        }
    }

    /// Queues `msg` on every member's handle except `exclude`. Returns how
    /// many handles accepted it.
    pub fn broadcast(&self, exclude: Option<&ParticipantId>, msg: &ServerMessage) -> usize {
        self.participants
            .iter()
            .filter(|p| Some(&p.id) != exclude)
            .filter(|p| p.handle.send(msg.clone()))
            .count()
    }

    pub(crate) fn position(&self, participant_id: &ParticipantId) -> Option<usize> {
        self.participants.iter().position(|p| &p.id == participant_id)
    }

    pub(crate) fn push(&mut self, participant: Participant) {
        self.participants.push(participant);
    }

    /// Swaps in a new handle and name for the member at `index`, keeping its
    /// place in the arrival order. Returns the member that was replaced.
    pub(crate) fn replace(&mut self, index: usize, participant: Participant) -> Participant {
        std::mem::replace(&mut self.participants[index], participant)
    }

    pub(crate) fn remove(&mut self, index: usize) -> Participant {
        self.participants.remove(index)
    }
}
