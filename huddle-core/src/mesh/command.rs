use crate::model::{ClientMessage, IceCandidate, ParticipantId};

/// Side effects requested by [`Mesh`](super::Mesh). Drivers execute them
/// against a real peer-connection stack and report results back through the
/// `on_*` callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshCommand {
    /// Write a message to the signaling socket.
    Send(ClientMessage),

    /// Create the peer connection for `remote_id` and attach local tracks.
    OpenLink {
        remote_id: ParticipantId,
        remote_name: String,
    },

    /// Create an offer, set it as local description, then report it with
    /// `on_local_description`.
    CreateOffer {
        remote_id: ParticipantId,
        ice_restart: bool,
    },

    /// Set the remote offer, report `on_remote_description_applied`, then
    /// create and set the answer and report it with `on_local_description`.
    AcceptOffer { remote_id: ParticipantId, sdp: String },

    /// Set the remote answer, then report `on_remote_description_applied`.
    ApplyAnswer { remote_id: ParticipantId, sdp: String },

    AddIceCandidate {
        remote_id: ParticipantId,
        candidate: IceCandidate,
    },

    /// Close and drop the peer connection.
    CloseLink { remote_id: ParticipantId },
}

impl MeshCommand {
    /// The link this command operates on, `None` for signaling writes.
    pub fn remote_id(&self) -> Option<&ParticipantId> {
        match self {
            Self::Send(_) => None,
            Self::OpenLink { remote_id, .. }
            | Self::CreateOffer { remote_id, .. }
            | Self::AcceptOffer { remote_id, .. }
            | Self::ApplyAnswer { remote_id, .. }
            | Self::AddIceCandidate { remote_id, .. }
            | Self::CloseLink { remote_id } => Some(remote_id),
        }
    }
}
