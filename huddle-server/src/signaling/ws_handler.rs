use crate::error::SignalingError;
use crate::signaling::SignalingService;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, RoomId};
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let (handle, mut rx) = service.connect();
    let connection_id = handle.id();
    info!("New WebSocket connection: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to serialize server message: {}", e),
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match decode_client_message(&text) {
                        Ok(client_msg) => service.coordinator().dispatch(&handle, client_msg),
                        Err(err) => {
                            warn!("Invalid ClientMessage from {}: {}", handle.id(), err);
                            if let Some(event) = err.to_event() {
                                handle.send(event);
                            }
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.coordinator().disconnect(connection_id);
    info!("WebSocket disconnected: {}", connection_id);
}

/// Decodes one text frame. A `join-room` whose room id fails validation is
/// `InvalidRoom`; anything else that does not decode is `InvalidMessage`.
pub fn decode_client_message(text: &str) -> Result<ClientMessage, SignalingError> {
    serde_json::from_str::<ClientMessage>(text).map_err(|e| {
        rejected_room(text).unwrap_or_else(|| SignalingError::InvalidMessage(e.to_string()))
    })
}

fn rejected_room(text: &str) -> Option<SignalingError> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    if value.get("op")?.as_str()? != "join-room" {
        return None;
    }
    let room_id = value.get("d")?.get("roomId")?.as_str()?;
    RoomId::parse(room_id).err().map(SignalingError::from)
}
