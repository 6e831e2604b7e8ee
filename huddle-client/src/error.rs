use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("signaling socket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("webrtc transport error: {0:#}")]
    WebRtc(#[from] anyhow::Error),

    #[error("malformed signaling frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("client loop has stopped")]
    ChannelClosed,
}
