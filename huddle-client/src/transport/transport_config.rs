use huddle_core::IceServerConfig;
use huddle_core::utils::default_ice_servers;
use webrtc::ice_transport::ice_server::RTCIceServer;

/// WebRTC settings shared by every peer connection of one client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    /// Gather 127.0.0.1 candidates too. Only useful when every participant
    /// runs on the same host.
    pub include_loopback_candidates: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: default_ice_servers(),
            include_loopback_candidates: false,
        }
    }
}

impl TransportConfig {
    pub fn rtc_ice_servers(&self) -> Vec<RTCIceServer> {
        self.ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
            })
            .collect()
    }
}
