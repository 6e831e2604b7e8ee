use huddle_core::mesh::MeshConfig;
use huddle_core::{IceServerConfig, ParticipantId, RoomId};

/// Everything a native participant needs to join a room.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Signaling endpoint, e.g. `ws://127.0.0.1:3000/ws`.
    pub server_url: String,
    pub room_id: RoomId,
    pub participant_id: ParticipantId,
    pub display_name: String,
    /// Replaces the ICE servers pushed by the coordinator when set.
    pub ice_servers: Option<Vec<IceServerConfig>>,
    pub include_loopback_candidates: bool,
    pub mesh: MeshConfig,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>, room_id: RoomId, display_name: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            room_id,
            participant_id: ParticipantId::generate(),
            display_name: display_name.into(),
            ice_servers: None,
            include_loopback_candidates: false,
            mesh: MeshConfig::default(),
        }
    }

    pub fn with_participant_id(mut self, participant_id: ParticipantId) -> Self {
        self.participant_id = participant_id;
        self
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServerConfig>) -> Self {
        self.ice_servers = Some(ice_servers);
        self
    }

    pub fn with_loopback_candidates(mut self, include: bool) -> Self {
        self.include_loopback_candidates = include;
        self
    }

    pub fn with_negotiation_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.mesh.negotiation_timeout_ms = timeout_ms;
        self
    }
}
