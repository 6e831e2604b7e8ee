use huddle_core::mesh::MeshConfig;
use huddle_core::{ParticipantId, RoomId};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::engine::{EngineConfig, HuddleEngine};
use crate::logger::Logger;

/// Survives reloads of the same tab so a refresh rejoins as the same
/// participant.
const PARTICIPANT_ID_KEY: &str = "huddle.participantId";

/// Entry point for the room page.
#[wasm_bindgen]
pub struct HuddleClient {
    engine: HuddleEngine,
}

#[wasm_bindgen]
impl HuddleClient {
    #[wasm_bindgen(constructor)]
    pub fn new(room_id: String, display_name: String) -> Result<HuddleClient, JsValue> {
        let room_id = RoomId::parse(room_id).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let config = EngineConfig {
            url: signaling_url()?,
            room_id,
            participant_id: session_participant_id(),
            display_name,
            mesh: MeshConfig::default(),
        };
        Ok(Self {
            engine: HuddleEngine::new(config),
        })
    }

    /// Resolves once media is settled and the signaling socket is open.
    pub fn start(&self) -> js_sys::Promise {
        let engine = self.engine.clone();
        future_to_promise(async move {
            engine.start().await?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Asks for camera and microphone again, e.g. after a chat-only start.
    #[wasm_bindgen(js_name = publishMedia)]
    pub fn publish_media(&self) -> js_sys::Promise {
        let engine = self.engine.clone();
        future_to_promise(async move {
            engine.publish_media().await?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn leave(&self) {
        self.engine.leave();
    }

    #[wasm_bindgen(js_name = sendChat)]
    pub fn send_chat(&self, text: String) {
        self.engine.send_chat(&text);
    }

    #[wasm_bindgen(js_name = setAudioEnabled)]
    pub fn set_audio_enabled(&self, enabled: bool) -> u32 {
        self.engine.set_tracks_enabled("audio", enabled)
    }

    #[wasm_bindgen(js_name = setVideoEnabled)]
    pub fn set_video_enabled(&self, enabled: bool) -> u32 {
        self.engine.set_tracks_enabled("video", enabled)
    }

    #[wasm_bindgen(js_name = participantId)]
    pub fn participant_id(&self) -> String {
        self.engine.local().id.to_string()
    }

    #[wasm_bindgen(js_name = onLocalStream)]
    pub fn on_local_stream(&self, cb: js_sys::Function) {
        self.engine.callbacks_mut().on_local_stream = Some(cb);
    }

    #[wasm_bindgen(js_name = onRemoteStream)]
    pub fn on_remote_stream(&self, cb: js_sys::Function) {
        self.engine.callbacks_mut().on_remote_stream = Some(cb);
    }

    #[wasm_bindgen(js_name = onRemoteLeft)]
    pub fn on_remote_left(&self, cb: js_sys::Function) {
        self.engine.callbacks_mut().on_remote_left = Some(cb);
    }

    #[wasm_bindgen(js_name = onJoined)]
    pub fn on_joined(&self, cb: js_sys::Function) {
        self.engine.callbacks_mut().on_joined = Some(cb);
    }

    #[wasm_bindgen(js_name = onNotice)]
    pub fn on_notice(&self, cb: js_sys::Function) {
        self.engine.callbacks_mut().on_notice = Some(cb);
    }

    #[wasm_bindgen(js_name = onChat)]
    pub fn on_chat(&self, cb: js_sys::Function) {
        self.engine.callbacks_mut().on_chat = Some(cb);
    }

    #[wasm_bindgen(js_name = onError)]
    pub fn on_error(&self, cb: js_sys::Function) {
        self.engine.callbacks_mut().on_error = Some(cb);
    }
}

/// `ws(s)://<host>/ws` for the page's own origin.
fn signaling_url() -> Result<String, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let location = window.location();
    let scheme = if location.protocol()? == "https:" {
        "wss"
    } else {
        "ws"
    };
    Ok(format!("{}://{}/ws", scheme, location.host()?))
}

fn session_participant_id() -> ParticipantId {
    let storage = web_sys::window().and_then(|w| w.session_storage().ok().flatten());
    let Some(storage) = storage else {
        return ParticipantId::generate();
    };

    if let Ok(Some(stored)) = storage.get_item(PARTICIPANT_ID_KEY)
        && let Ok(id) = ParticipantId::parse(stored)
    {
        return id;
    }

    let id = ParticipantId::generate();
    if let Err(e) = storage.set_item(PARTICIPANT_ID_KEY, id.as_str()) {
        Logger::error("Could not persist participant id", &e);
    }
    id
}
