use std::time::Duration;

use huddle_core::{ClientMessage, ServerMessage};
use huddle_server::{ConnectionHandle, SignalingService};
use tokio::sync::mpsc;

use crate::utils::{pid, room};

/// An in-process connection: talks to the coordinator exactly like the
/// WebSocket handler does, minus the socket.
pub struct TestConnection {
    pub handle: ConnectionHandle,
    rx: mpsc::UnboundedReceiver<ServerMessage>,
    service: SignalingService,
}

impl TestConnection {
    /// Opens a connection and consumes the initial `ice-config`.
    pub fn open(service: &SignalingService) -> Self {
        let (handle, mut rx) = service.connect();
        match rx.try_recv() {
            Ok(ServerMessage::IceConfig { .. }) => {}
            other => panic!("expected ice-config first, got {other:?}"),
        }
        Self {
            handle,
            rx,
            service: service.clone(),
        }
    }

    pub fn send(&self, msg: ClientMessage) {
        self.service.coordinator().dispatch(&self.handle, msg);
    }

    pub fn join(&self, room_id: &str, participant_id: &str, display_name: &str) {
        self.send(ClientMessage::JoinRoom {
            room_id: room(room_id),
            participant_id: pid(participant_id),
            display_name: display_name.to_string(),
        });
    }

    pub fn chat(&self, text: &str) {
        self.send(ClientMessage::ChatMessage {
            text: text.to_string(),
        });
    }

    pub async fn recv(&mut self) -> ServerMessage {
        tokio::time::timeout(Duration::from_secs(2), self.rx.recv())
            .await
            .expect("timed out waiting for a server message")
            .expect("connection channel closed")
    }

    /// Everything queued so far.
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }

    pub fn assert_silent(&mut self) {
        let pending = self.drain();
        assert!(pending.is_empty(), "unexpected messages: {pending:?}");
    }

    pub fn disconnect(&self) {
        self.service.coordinator().disconnect(self.handle.id());
    }
}
