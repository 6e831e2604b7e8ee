use huddle_core::mesh::LinkState;
use huddle_core::{IceCandidate, ParticipantId};

/// Raised by a [`PeerTransport`](super::PeerTransport) callback for the
/// client loop.
///
/// `generation` tells apart two transports opened for the same remote one
/// after the other; events from a replaced transport are dropped.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    StateChanged {
        remote_id: ParticipantId,
        generation: u64,
        state: LinkState,
    },

    /// A local ICE candidate to trickle to the remote through signaling.
    CandidateGenerated {
        remote_id: ParticipantId,
        generation: u64,
        candidate: IceCandidate,
    },

    DataChannelOpen {
        remote_id: ParticipantId,
        generation: u64,
    },
}

impl TransportEvent {
    pub fn source(&self) -> (&ParticipantId, u64) {
        match self {
            Self::StateChanged {
                remote_id,
                generation,
                ..
            }
            | Self::CandidateGenerated {
                remote_id,
                generation,
                ..
            }
            | Self::DataChannelOpen {
                remote_id,
                generation,
            } => (remote_id, *generation),
        }
    }
}
