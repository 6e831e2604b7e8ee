use crate::transport::ConnectionHandle;
use huddle_core::{ParticipantId, ParticipantInfo, normalize_display_name};

/// A room member as the server sees it: identity plus the one live handle
/// messages for it are delivered to.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    pub handle: ConnectionHandle,
}

impl Participant {
    pub fn new(id: ParticipantId, display_name: &str, handle: ConnectionHandle) -> Self {
        Self {
            id,
            display_name: normalize_display_name(display_name),
            handle,
        }
    }

    pub fn info(&self) -> ParticipantInfo {
        ParticipantInfo {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
        }
    }
}
