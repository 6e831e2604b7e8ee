//! Client-side mesh formation.
//!
//! [`Mesh`] holds one [`PeerLink`] per remote participant and decides who
//! offers to whom. It performs no I/O: every input is a server message or a
//! driver callback, every output is a [`MeshCommand`].
//!
//! The participant that is already in the room when `user-connected(X)`
//! arrives offers to X. The newcomer opens its links from `current-users` as
//! responder and waits. Each pair therefore has exactly one offerer, and that
//! side keeps offering for every renegotiation and ICE restart.

mod command;
mod config;
mod error;
mod peer_link;

pub use command::MeshCommand;
pub use config::MeshConfig;
pub use error::ClientError;
pub use peer_link::{LinkState, PeerLink, Role, SdpKind, SessionDescription};

use crate::model::{
    ClientMessage, IceCandidate, NoPayload, ParticipantId, ParticipantInfo, RoomId,
    ServerMessage, SignalPayload,
};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::{debug, info, warn};

pub struct Mesh {
    local: ParticipantInfo,
    room_id: Option<RoomId>,
    config: MeshConfig,
    links: BTreeMap<ParticipantId, PeerLink>,
}

impl Mesh {
    pub fn new(local: ParticipantInfo, config: MeshConfig) -> Self {
        Self {
            local,
            room_id: None,
            config,
            links: BTreeMap::new(),
        }
    }

    pub fn local(&self) -> &ParticipantInfo {
        &self.local
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_ref()
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    pub fn link(&self, remote_id: &ParticipantId) -> Option<&PeerLink> {
        self.links.get(remote_id)
    }

    pub fn links(&self) -> impl Iterator<Item = &PeerLink> {
        self.links.values()
    }

    pub fn join(&mut self, room_id: RoomId) -> Vec<MeshCommand> {
        let mut commands = Vec::new();
        if self.room_id.as_ref().is_some_and(|current| current != &room_id) {
            commands.extend(self.leave());
        }

        info!("Joining room {} as {}", room_id, self.local.id);
        self.room_id = Some(room_id.clone());
        commands.push(MeshCommand::Send(ClientMessage::JoinRoom {
            room_id,
            participant_id: self.local.id.clone(),
            display_name: self.local.display_name.clone(),
        }));
        commands
    }

    /// Closes every link and leaves the room. Safe to call on any exit path,
    /// including when nothing was joined.
    pub fn leave(&mut self) -> Vec<MeshCommand> {
        let mut commands: Vec<MeshCommand> = std::mem::take(&mut self.links)
            .into_keys()
            .map(|remote_id| MeshCommand::CloseLink { remote_id })
            .collect();

        if self.room_id.take().is_some() {
            commands.push(MeshCommand::Send(ClientMessage::LeaveRoom(NoPayload)));
        }
        commands
    }

    pub fn chat(&self, text: impl Into<String>) -> MeshCommand {
        MeshCommand::Send(ClientMessage::ChatMessage { text: text.into() })
    }

    pub fn handle_server_message(&mut self, msg: &ServerMessage, now_ms: u64) -> Vec<MeshCommand> {
        match msg {
            ServerMessage::CurrentUsers { users } => self.on_snapshot(users),

            ServerMessage::UserConnected {
                participant_id,
                display_name,
            } => self.on_arrival(participant_id, display_name, now_ms),

            ServerMessage::UserDisconnected { participant_id, .. } => {
                match self.links.remove(participant_id) {
                    Some(_) => vec![MeshCommand::CloseLink {
                        remote_id: participant_id.clone(),
                    }],
                    None => Vec::new(),
                }
            }

            ServerMessage::ReceiveOffer {
                sender_id,
                sender_name,
                sdp,
            } => self.on_remote_offer(sender_id, sender_name, sdp, now_ms),

            ServerMessage::ReceiveAnswer { sender_id, sdp, .. } => {
                self.on_remote_answer(sender_id, sdp)
            }

            ServerMessage::ReceiveIceCandidate {
                sender_id,
                candidate,
                ..
            } => self.on_remote_candidate(sender_id, candidate),

            ServerMessage::Error { code, message } => {
                warn!("Server rejected a request ({:?}): {}", code, message);
                Vec::new()
            }

            ServerMessage::IceConfig { .. } | ServerMessage::ReceiveMessage { .. } => Vec::new(),
        }
    }

    fn on_snapshot(&mut self, users: &[ParticipantInfo]) -> Vec<MeshCommand> {
        let mut commands = Vec::new();

        for user in users.iter().filter(|u| u.id != self.local.id) {
            if let Entry::Vacant(slot) = self.links.entry(user.id.clone()) {
                debug!("Awaiting offer from existing participant {}", user.id);
                slot.insert(PeerLink::new(
                    user.id.clone(),
                    user.display_name.clone(),
                    Role::Responder,
                ));
                commands.push(MeshCommand::OpenLink {
                    remote_id: user.id.clone(),
                    remote_name: user.display_name.clone(),
                });
            }
        }

        commands
    }

    fn on_arrival(
        &mut self,
        remote_id: &ParticipantId,
        remote_name: &str,
        now_ms: u64,
    ) -> Vec<MeshCommand> {
        if remote_id == &self.local.id {
            return Vec::new();
        }

        let mut commands = Vec::new();

        // Same id arriving again means the old session is gone.
        if self.links.remove(remote_id).is_some() {
            commands.push(MeshCommand::CloseLink {
                remote_id: remote_id.clone(),
            });
        }

        info!("Participant {} arrived, offering as initiator", remote_id);
        let mut link = PeerLink::new(remote_id.clone(), remote_name.to_owned(), Role::Initiator);
        link.begin_negotiation(now_ms);
        self.links.insert(remote_id.clone(), link);

        commands.push(MeshCommand::OpenLink {
            remote_id: remote_id.clone(),
            remote_name: remote_name.to_owned(),
        });
        commands.push(MeshCommand::CreateOffer {
            remote_id: remote_id.clone(),
            ice_restart: false,
        });
        commands
    }

    fn on_remote_offer(
        &mut self,
        sender_id: &ParticipantId,
        sender_name: &str,
        sdp: &str,
        now_ms: u64,
    ) -> Vec<MeshCommand> {
        let mut commands = Vec::new();

        let link = match self.links.entry(sender_id.clone()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                commands.push(MeshCommand::OpenLink {
                    remote_id: sender_id.clone(),
                    remote_name: sender_name.to_owned(),
                });
                slot.insert(PeerLink::new(
                    sender_id.clone(),
                    sender_name.to_owned(),
                    Role::Responder,
                ))
            }
        };

        if link.role == Role::Initiator {
            warn!(
                "Ignoring offer from {}: this side is the initiator for the pair",
                sender_id
            );
            return commands;
        }

        link.set_remote(SdpKind::Offer, sdp.to_owned());
        link.local_description = None;
        link.begin_negotiation(now_ms);

        commands.push(MeshCommand::AcceptOffer {
            remote_id: sender_id.clone(),
            sdp: sdp.to_owned(),
        });
        commands
    }

    fn on_remote_answer(&mut self, sender_id: &ParticipantId, sdp: &str) -> Vec<MeshCommand> {
        let Some(link) = self.links.get_mut(sender_id) else {
            debug!("Dropping answer from {}: no link", sender_id);
            return Vec::new();
        };

        if link.role != Role::Initiator || !link.awaiting_answer {
            warn!("Ignoring unexpected answer from {}", sender_id);
            return Vec::new();
        }

        link.awaiting_answer = false;
        link.set_remote(SdpKind::Answer, sdp.to_owned());

        vec![MeshCommand::ApplyAnswer {
            remote_id: sender_id.clone(),
            sdp: sdp.to_owned(),
        }]
    }

    fn on_remote_candidate(
        &mut self,
        sender_id: &ParticipantId,
        candidate: &IceCandidate,
    ) -> Vec<MeshCommand> {
        let Some(link) = self.links.get_mut(sender_id) else {
            debug!("Dropping ICE candidate from {}: no link", sender_id);
            return Vec::new();
        };

        if !link.remote_applied {
            link.ice_candidate_queue.push(candidate.clone());
            return Vec::new();
        }

        vec![MeshCommand::AddIceCandidate {
            remote_id: sender_id.clone(),
            candidate: candidate.clone(),
        }]
    }

    /// The driver created and set a local description for `remote_id`.
    pub fn on_local_description(
        &mut self,
        remote_id: &ParticipantId,
        kind: SdpKind,
        sdp: String,
    ) -> Vec<MeshCommand> {
        let Some(link) = self.links.get_mut(remote_id) else {
            debug!("Local {:?} for {} has no link anymore", kind, remote_id);
            return Vec::new();
        };

        let payload = match kind {
            SdpKind::Offer => {
                link.awaiting_answer = true;
                SignalPayload::Offer { sdp: sdp.clone() }
            }
            SdpKind::Answer => {
                link.settle();
                SignalPayload::Answer { sdp: sdp.clone() }
            }
        };
        link.local_description = Some(SessionDescription { kind, sdp });

        vec![MeshCommand::Send(
            payload.into_client_message(remote_id.clone()),
        )]
    }

    /// The remote description is in place: queued candidates can be applied.
    pub fn on_remote_description_applied(
        &mut self,
        remote_id: &ParticipantId,
        now_ms: u64,
    ) -> Vec<MeshCommand> {
        let Some(link) = self.links.get_mut(remote_id) else {
            return Vec::new();
        };

        link.remote_applied = true;
        let mut commands: Vec<MeshCommand> = link
            .ice_candidate_queue
            .drain(..)
            .map(|candidate| MeshCommand::AddIceCandidate {
                remote_id: remote_id.clone(),
                candidate,
            })
            .collect();

        if link.role == Role::Initiator && link.renegotiation_pending {
            link.renegotiation_pending = false;
            link.begin_negotiation(now_ms);
            commands.push(MeshCommand::CreateOffer {
                remote_id: remote_id.clone(),
                ice_restart: false,
            });
        } else if link
            .remote_description
            .as_ref()
            .is_some_and(|description| description.kind == SdpKind::Answer)
        {
            link.settle();
        }

        commands
    }

    pub fn on_local_candidate(
        &mut self,
        remote_id: &ParticipantId,
        candidate: IceCandidate,
    ) -> Vec<MeshCommand> {
        if !self.links.contains_key(remote_id) {
            return Vec::new();
        }

        vec![MeshCommand::Send(
            SignalPayload::IceCandidate(candidate).into_client_message(remote_id.clone()),
        )]
    }

    pub fn on_connection_state(
        &mut self,
        remote_id: &ParticipantId,
        state: LinkState,
        now_ms: u64,
    ) -> Vec<MeshCommand> {
        let Some(link) = self.links.get_mut(remote_id) else {
            return Vec::new();
        };

        debug!("Link {} is now {}", remote_id, state);
        match state {
            LinkState::Connected => {
                link.state = LinkState::Connected;
                link.negotiation_started_at = None;
                link.ice_restarts = 0;
                link.transport_up = true;
                Vec::new()
            }
            LinkState::Disconnected => {
                link.state = LinkState::Disconnected;
                link.transport_up = false;
                Vec::new()
            }
            LinkState::Failed => {
                link.state = LinkState::Failed;
                link.negotiation_started_at = None;
                link.transport_up = false;
                self.try_ice_restart(remote_id, now_ms)
            }
            LinkState::Closed => {
                self.links.remove(remote_id);
                vec![MeshCommand::CloseLink {
                    remote_id: remote_id.clone(),
                }]
            }
            LinkState::New | LinkState::Negotiating => Vec::new(),
        }
    }

    /// An offer/answer/candidate step failed locally. Only this link is
    /// affected; it stays `failed` until restarted.
    pub fn on_negotiation_error(&mut self, error: &ClientError) {
        let ClientError::NegotiationFailure { remote_id, .. } = error else {
            return;
        };

        warn!("{}", error);
        if let Some(link) = self.links.get_mut(remote_id) {
            link.state = LinkState::Failed;
            link.negotiation_started_at = None;
            link.awaiting_answer = false;
        }
    }

    /// Local tracks changed and the session needs a fresh offer. Only the
    /// initiator of the pair sends it.
    pub fn renegotiate(&mut self, remote_id: &ParticipantId, now_ms: u64) -> Vec<MeshCommand> {
        let Some(link) = self.links.get_mut(remote_id) else {
            return Vec::new();
        };

        if link.role != Role::Initiator {
            debug!("Renegotiation with {} is driven by the remote side", remote_id);
            return Vec::new();
        }

        if link.awaiting_answer || (!link.remote_applied && link.remote_description.is_some()) {
            link.renegotiation_pending = true;
            return Vec::new();
        }

        link.begin_negotiation(now_ms);
        vec![MeshCommand::CreateOffer {
            remote_id: remote_id.clone(),
            ice_restart: false,
        }]
    }

    /// Re-runs the offer/answer handshake with an ICE restart on an existing
    /// initiator link.
    pub fn restart_ice(&mut self, remote_id: &ParticipantId, now_ms: u64) -> Vec<MeshCommand> {
        let Some(link) = self.links.get_mut(remote_id) else {
            return Vec::new();
        };

        if link.role != Role::Initiator {
            return Vec::new();
        }

        link.ice_restarts += 1;
        link.awaiting_answer = false;
        link.begin_negotiation(now_ms);
        info!(
            "Restarting ICE with {} (attempt {})",
            remote_id, link.ice_restarts
        );

        vec![MeshCommand::CreateOffer {
            remote_id: remote_id.clone(),
            ice_restart: true,
        }]
    }

    fn try_ice_restart(&mut self, remote_id: &ParticipantId, now_ms: u64) -> Vec<MeshCommand> {
        let max = self.config.max_ice_restarts;
        match self.links.get(remote_id) {
            Some(link) if link.role == Role::Initiator && link.ice_restarts < max => {
                self.restart_ice(remote_id, now_ms)
            }
            Some(link) if link.role == Role::Initiator => {
                warn!("Giving up on {} after {} ICE restarts", remote_id, max);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Fails links stuck in `negotiating` for longer than the configured
    /// timeout and restarts the ones this side initiated.
    pub fn poll_timeouts(&mut self, now_ms: u64) -> Vec<MeshCommand> {
        let timeout = self.config.negotiation_timeout_ms;
        let expired: Vec<ParticipantId> = self
            .links
            .values()
            .filter(|link| link.negotiation_expired(now_ms, timeout))
            .map(|link| link.remote_id.clone())
            .collect();

        let mut commands = Vec::new();
        for remote_id in expired {
            warn!("Negotiation with {} timed out", remote_id);
            commands.extend(self.on_connection_state(&remote_id, LinkState::Failed, now_ms));
        }
        commands
    }
}
