use crate::error::SignalingError;
use crate::room::{Participant, Room, RoomSnapshot};
use crate::transport::ConnectionId;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use huddle_core::{ParticipantId, ParticipantInfo, RoomId, ServerMessage};
use std::str::FromStr;
use tracing::info;

/// What happens when a participant id joins a room it is already in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejoinPolicy {
    /// The second join fails with `DuplicateParticipant`.
    #[default]
    Reject,
    /// The second join takes over: same position, new handle.
    ReplaceHandle,
}

impl FromStr for RejoinPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "replace" | "replace-handle" => Ok(Self::ReplaceHandle),
            other => Err(format!("unknown rejoin policy {other:?}, expected reject|replace")),
        }
    }
}

/// Result of a successful join.
#[derive(Debug, Clone)]
pub struct Admission {
    pub participant: ParticipantInfo,
    pub snapshot: RoomSnapshot,
    /// The member this join displaced, under `RejoinPolicy::ReplaceHandle`.
    pub replaced: Option<Participant>,
}

/// Process-wide map from room id to its members.
///
/// Each room is only touched under its map entry guard, so operations on one
/// room are linearized while unrelated rooms proceed independently. The
/// callbacks passed to [`join_and`](Self::join_and) and
/// [`leave_and`](Self::leave_and) run under that guard: they may queue
/// messages on handles but must not call back into the table.
pub struct RoomTable {
    rooms: DashMap<RoomId, Room>,
    rejoin_policy: RejoinPolicy,
}

impl RoomTable {
    pub fn new(rejoin_policy: RejoinPolicy) -> Self {
        Self {
            rooms: DashMap::new(),
            rejoin_policy,
        }
    }

    pub fn rejoin_policy(&self) -> RejoinPolicy {
        self.rejoin_policy
    }

    pub fn join(
        &self,
        room_id: &RoomId,
        participant: Participant,
    ) -> Result<RoomSnapshot, SignalingError> {
        self.join_and(room_id, participant, |_, _| {})
            .map(|admission| admission.snapshot)
    }

    /// Admits `participant`, creating the room if needed, then runs
    /// `on_admitted` before any other operation on the room can observe the
    /// new member.
    pub fn join_and<F>(
        &self,
        room_id: &RoomId,
        participant: Participant,
        on_admitted: F,
    ) -> Result<Admission, SignalingError>
    where
        F: FnOnce(&Room, &Admission),
    {
        let mut entry = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room_id);
            Room::new(room_id.clone())
        });
        let room = entry.value_mut();

        let replaced = match room.position(&participant.id) {
            None => {
                room.push(participant.clone());
                None
            }
            Some(index) => match self.rejoin_policy {
                RejoinPolicy::Reject => {
                    return Err(SignalingError::DuplicateParticipant {
                        room_id: room_id.clone(),
                        participant_id: participant.id,
                    });
                }
                RejoinPolicy::ReplaceHandle => Some(room.replace(index, participant.clone())),
            },
        };

        let admission = Admission {
            participant: participant.info(),
            snapshot: room.snapshot_excluding(&participant.id),
            replaced,
        };

        on_admitted(room, &admission);
        Ok(admission)
    }

    /// Removes a participant. Missing rooms or members are a no-op.
    pub fn leave(&self, room_id: &RoomId, participant_id: &ParticipantId) -> Option<Participant> {
        self.leave_and(room_id, participant_id, None, |_, _| {})
    }

    /// Removes a participant and runs `on_departed` under the room guard.
    ///
    /// With `expected_connection` set, nothing happens unless the member is
    /// still bound to that connection. The room is deleted once empty.
    pub fn leave_and<F>(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        expected_connection: Option<ConnectionId>,
        on_departed: F,
    ) -> Option<Participant>
    where
        F: FnOnce(&Room, &Participant),
    {
        let Entry::Occupied(mut entry) = self.rooms.entry(room_id.clone()) else {
            return None;
        };

        let room = entry.get_mut();
        let index = room.position(participant_id)?;

        if let Some(expected) = expected_connection
            && room.participants()[index].handle.id() != expected
        {
            return None;
        }

        let departed = room.remove(index);
        on_departed(room, &departed);

        if room.is_empty() {
            entry.remove();
            info!("Room {} is empty, removing", room_id);
        }

        Some(departed)
    }

    pub fn lookup(&self, room_id: &RoomId, participant_id: &ParticipantId) -> Option<Participant> {
        self.rooms.get(room_id)?.get(participant_id).cloned()
    }

    pub fn broadcast(
        &self,
        room_id: &RoomId,
        exclude: Option<&ParticipantId>,
        msg: &ServerMessage,
    ) -> usize {
        // Exclusive guard: every member sees broadcasts in the same order.
        self.rooms
            .get_mut(room_id)
            .map(|room| room.broadcast(exclude, msg))
            .unwrap_or(0)
    }

    /// Every member of the room in arrival order.
    pub fn snapshot(&self, room_id: &RoomId) -> Option<Vec<ParticipantInfo>> {
        self.rooms
            .get(room_id)
            .map(|room| room.participants().iter().map(Participant::info).collect())
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn participant_count(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map(|room| room.len()).unwrap_or(0)
    }
}

impl Default for RoomTable {
    fn default() -> Self {
        Self::new(RejoinPolicy::default())
    }
}
