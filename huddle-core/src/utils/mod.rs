use crate::model::IceServerConfig;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:global.stun.twilio.com:3478";

pub const MAX_ROOM_ID_LEN: usize = 64;
pub const MAX_PARTICIPANT_ID_LEN: usize = 128;
pub const MAX_DISPLAY_NAME_LEN: usize = 64;
pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous";

pub const DEFAULT_NEGOTIATION_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_MAX_ICE_RESTARTS: u32 = 3;

pub fn default_ice_servers() -> Vec<IceServerConfig> {
    vec![
        IceServerConfig::stun(DEFAULT_STUN_ADDR),
        IceServerConfig::stun(DEFAULT_STUN_ADDR_2),
    ]
}
