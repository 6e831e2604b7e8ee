use crate::model::{IceCandidate, ParticipantId};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    New,
    Negotiating,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Negotiating => "negotiating",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Which side of the pair sends offers. Fixed when the link is created and
/// kept for every renegotiation and ICE restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub kind: SdpKind,
    pub sdp: String,
}

/// Local view of the connection to one remote participant.
#[derive(Debug, Clone)]
pub struct PeerLink {
    pub(crate) remote_id: ParticipantId,
    pub(crate) remote_name: String,
    pub(crate) role: Role,
    pub(crate) state: LinkState,
    pub(crate) local_description: Option<SessionDescription>,
    pub(crate) remote_description: Option<SessionDescription>,
    pub(crate) remote_applied: bool,
    pub(crate) ice_candidate_queue: Vec<IceCandidate>,
    pub(crate) awaiting_answer: bool,
    pub(crate) renegotiation_pending: bool,
    pub(crate) negotiation_started_at: Option<u64>,
    pub(crate) ice_restarts: u32,
    pub(crate) transport_up: bool,
}

impl PeerLink {
    pub(crate) fn new(remote_id: ParticipantId, remote_name: String, role: Role) -> Self {
        Self {
            remote_id,
            remote_name,
            role,
            state: LinkState::New,
            local_description: None,
            remote_description: None,
            remote_applied: false,
            ice_candidate_queue: Vec::new(),
            awaiting_answer: false,
            renegotiation_pending: false,
            negotiation_started_at: None,
            ice_restarts: 0,
            transport_up: false,
        }
    }

    pub fn remote_id(&self) -> &ParticipantId {
        &self.remote_id
    }

    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local_description.as_ref()
    }

    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote_description.as_ref()
    }

    /// Remote candidates held back until the remote description is applied.
    pub fn queued_candidates(&self) -> &[IceCandidate] {
        &self.ice_candidate_queue
    }

    pub fn ice_restarts(&self) -> u32 {
        self.ice_restarts
    }

    pub(crate) fn begin_negotiation(&mut self, now_ms: u64) {
        self.state = LinkState::Negotiating;
        self.negotiation_started_at = Some(now_ms);
    }

    /// A renegotiation over a live transport finished. The connection state
    /// never leaves `connected` in that case, so no driver event restores it.
    pub(crate) fn settle(&mut self) {
        if self.transport_up && self.state == LinkState::Negotiating {
            self.state = LinkState::Connected;
            self.negotiation_started_at = None;
        }
    }

    pub(crate) fn negotiation_expired(&self, now_ms: u64, timeout_ms: u64) -> bool {
        self.state == LinkState::Negotiating
            && self
                .negotiation_started_at
                .is_some_and(|started| now_ms.saturating_sub(started) >= timeout_ms)
    }

    /// A new remote description re-arms the candidate queue until the driver
    /// confirms it.
    pub(crate) fn set_remote(&mut self, kind: SdpKind, sdp: String) {
        self.remote_description = Some(SessionDescription { kind, sdp });
        self.remote_applied = false;
    }
}
