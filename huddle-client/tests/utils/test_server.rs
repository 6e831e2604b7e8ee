use std::net::SocketAddr;

use huddle_client::{ClientConfig, ClientSession, MeshClient};
use huddle_core::{ParticipantId, RoomId};
use huddle_server::{ServerConfig, SignalingService, serve_with_shutdown};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub struct TestServer {
    pub addr: SocketAddr,
    pub service: SignalingService,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    /// A coordinator on an ephemeral port that hands out no ICE servers, so
    /// clients only gather host candidates.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let service = SignalingService::new(ServerConfig {
            ice_servers: vec![],
            ..ServerConfig::default()
        });
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let server = service.clone();
        tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            let _ = serve_with_shutdown(listener, server, shutdown).await;
        });

        Self {
            addr,
            service,
            _shutdown: shutdown_tx,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub async fn connect(&self, room: &str, participant: &str, name: &str) -> ClientSession {
        let config = ClientConfig::new(
            self.ws_url(),
            RoomId::parse(room).expect("valid room id"),
            name,
        )
        .with_participant_id(ParticipantId::parse(participant).expect("valid participant id"))
        .with_loopback_candidates(true);

        MeshClient::connect(config)
            .await
            .expect("Failed to connect client")
    }
}
