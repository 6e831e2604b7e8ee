use crate::utils::{DEFAULT_MAX_ICE_RESTARTS, DEFAULT_NEGOTIATION_TIMEOUT_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshConfig {
    /// How long a link may stay in `negotiating` before it is considered failed.
    pub negotiation_timeout_ms: u64,
    /// ICE restarts an initiator attempts per link before leaving it failed.
    pub max_ice_restarts: u32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            negotiation_timeout_ms: DEFAULT_NEGOTIATION_TIMEOUT_MS,
            max_ice_restarts: DEFAULT_MAX_ICE_RESTARTS,
        }
    }
}
