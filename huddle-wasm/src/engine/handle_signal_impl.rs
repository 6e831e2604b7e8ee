use std::cell::RefCell;
use std::rc::Rc;

use huddle_core::{ErrorCode, ServerMessage};
use wasm_bindgen::JsValue;

use crate::HuddleEngine;
use crate::engine::EngineInner;
use crate::engine::callbacks::{Callbacks, local_time_of};
use crate::logger::Logger;

impl HuddleEngine {
    pub(super) fn handle_signal(inner: &Rc<RefCell<EngineInner>>, text: String) {
        let msg: ServerMessage = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                Logger::warn(&format!("JSON Error: {}. Text: {}", e, text));
                return;
            }
        };

        Self::notify_page(inner, &msg);

        let now = Self::now_ms();
        let mut commands = inner.borrow_mut().mesh.handle_server_message(&msg, now);

        if let ServerMessage::IceConfig { ice_servers } = msg {
            Logger::info(&format!("Received ICE Config: {} servers", ice_servers.len()));
            let mut inner_ref = inner.borrow_mut();
            if !ice_servers.is_empty() {
                inner_ref.ice_servers = ice_servers;
            }
            // A second ice-config (after a reconnect) must not join twice.
            if inner_ref.mesh.room_id().is_none() {
                let room_id = inner_ref.room_id.clone();
                commands.extend(inner_ref.mesh.join(room_id));
            }
        }

        Self::run(inner, commands);
    }

    /// Page-facing side of a server event. Runs before the mesh reacts so
    /// a departure notice precedes the removal of the remote's video.
    fn notify_page(inner: &Rc<RefCell<EngineInner>>, msg: &ServerMessage) {
        match msg {
            ServerMessage::CurrentUsers { users } => {
                let callback = inner.borrow().callbacks.on_joined.clone();
                match serde_wasm_bindgen::to_value(users) {
                    Ok(users) => Callbacks::call(callback.as_ref(), &[users]),
                    Err(e) => Logger::warn(&format!("Failed to convert user list: {}", e)),
                }
                let text = match users.len() {
                    0 => "You joined an empty room".to_string(),
                    n => format!("You joined with {} other participant(s)", n),
                };
                Self::notice(inner, &text);
            }

            ServerMessage::UserConnected { display_name, .. } => {
                Self::notice(inner, &format!("{} joined", display_name));
            }

            ServerMessage::UserDisconnected { display_name, .. } => {
                Self::notice(inner, &format!("{} left", display_name));
            }

            ServerMessage::ReceiveMessage {
                sender_id,
                sender_name,
                text,
                timestamp,
            } => {
                let (callback, local) = {
                    let inner = inner.borrow();
                    (
                        inner.callbacks.on_chat.clone(),
                        sender_id == &inner.mesh.local().id,
                    )
                };
                Callbacks::call(
                    callback.as_ref(),
                    &[
                        JsValue::from_str(sender_id.as_str()),
                        JsValue::from_str(sender_name),
                        JsValue::from_str(text),
                        JsValue::from_str(&local_time_of(&timestamp.to_rfc3339())),
                        JsValue::from_bool(local),
                    ],
                );
            }

            ServerMessage::Error { code, message } => {
                Logger::warn(&format!("Server error {:?}: {}", code, message));
                let text = match code {
                    ErrorCode::SessionReplaced => {
                        "This room was opened in another tab; this one no longer receives updates"
                            .to_string()
                    }
                    _ => message.clone(),
                };
                let callback = inner.borrow().callbacks.on_error.clone();
                Callbacks::call(callback.as_ref(), &[JsValue::from_str(&text)]);
            }

            ServerMessage::IceConfig { .. }
            | ServerMessage::ReceiveOffer { .. }
            | ServerMessage::ReceiveAnswer { .. }
            | ServerMessage::ReceiveIceCandidate { .. } => {}
        }
    }
}
