pub mod relay_tests;
pub mod room_tests;
pub mod transport_tests;

use std::net::SocketAddr;

use huddle_server::{ServerConfig, SignalingService, serve_with_shutdown};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_service() -> SignalingService {
    SignalingService::new(ServerConfig::default())
}

/// A running server on an ephemeral port. Dropping the returned sender
/// shuts it down.
pub async fn spawn_test_server(config: ServerConfig) -> (SocketAddr, SignalingService, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let service = SignalingService::new(config);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server = service.clone();
    tokio::spawn(async move {
        let shutdown = async move {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = serve_with_shutdown(listener, server, shutdown).await {
            panic!("test server failed: {e:#}");
        }
    });

    (addr, service, shutdown_tx)
}
