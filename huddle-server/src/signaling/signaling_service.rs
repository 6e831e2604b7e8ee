use crate::config::ServerConfig;
use crate::room::RoomTable;
use crate::session::SessionCoordinator;
use crate::transport::{ConnectionHandle, ConnectionRegistry};
use huddle_core::{IceServerConfig, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;

struct SignalingInner {
    coordinator: SessionCoordinator,
    config: ServerConfig,
}

/// Shared axum state: one per server process.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(config: ServerConfig) -> Self {
        let rooms = Arc::new(RoomTable::new(config.rejoin_policy));
        let registry = Arc::new(ConnectionRegistry::new());
        let coordinator = SessionCoordinator::new(rooms, registry, config.max_chat_len);

        Self {
            inner: Arc::new(SignalingInner {
                coordinator,
                config,
            }),
        }
    }

    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.inner.coordinator
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.config.ice_servers.clone()
    }

    /// Opens a connection handle with the ICE configuration already queued.
    pub fn connect(&self) -> (ConnectionHandle, mpsc::UnboundedReceiver<ServerMessage>) {
        let (handle, rx) = ConnectionHandle::channel();
        handle.send(ServerMessage::IceConfig {
            ice_servers: self.get_ice_servers(),
        });
        (handle, rx)
    }
}
