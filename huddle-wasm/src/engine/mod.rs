use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use huddle_core::mesh::{Mesh, MeshCommand, MeshConfig};
use huddle_core::utils::default_ice_servers;
use huddle_core::{ClientMessage, IceServerConfig, ParticipantId, ParticipantInfo, RoomId};
use wasm_bindgen::prelude::*;
use wasm_bindgen::{JsCast, JsValue};

use crate::logger::Logger;

mod callbacks;
mod create_pc_impl;
mod handle_signal_impl;
mod media_impl;
mod negotiate_impl;
mod ws_setup_impl;

pub use callbacks::Callbacks;

/// How often links stuck in negotiation are checked.
const TIMEOUT_POLL_MS: i32 = 1000;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Signaling endpoint, e.g. `wss://example.org/ws`.
    pub url: String,
    pub room_id: RoomId,
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub mesh: MeshConfig,
}

/// One browser peer connection toward a remote participant.
pub(crate) struct RemoteLink {
    pub(crate) pc: web_sys::RtcPeerConnection,
    /// Distinguishes this connection from an earlier one to the same
    /// remote; callbacks of a replaced connection are ignored.
    pub(crate) generation: u64,
    pub(crate) remote_name: String,
}

pub(crate) struct EngineInner {
    mesh: Mesh,
    room_id: RoomId,
    url: String,
    ws: Option<web_sys::WebSocket>,
    links: HashMap<ParticipantId, RemoteLink>,
    next_generation: u64,
    ice_servers: Vec<IceServerConfig>,
    local_stream: Option<web_sys::MediaStream>,
    timeout_timer: Option<i32>,
    callbacks: Callbacks,
}

/// Browser participant: runs the [`Mesh`] state machine over `web-sys`
/// peer connections and a signaling WebSocket.
#[derive(Clone)]
pub struct HuddleEngine {
    inner: Rc<RefCell<EngineInner>>,
}

impl HuddleEngine {
    pub fn new(config: EngineConfig) -> Self {
        let local = ParticipantInfo::new(config.participant_id, &config.display_name);
        let inner = Rc::new(RefCell::new(EngineInner {
            mesh: Mesh::new(local, config.mesh),
            room_id: config.room_id,
            url: config.url,
            ws: None,
            links: HashMap::new(),
            next_generation: 0,
            ice_servers: default_ice_servers(),
            local_stream: None,
            timeout_timer: None,
            callbacks: Callbacks::default(),
        }));

        Self { inner }
    }

    pub fn local(&self) -> ParticipantInfo {
        self.inner.borrow().mesh.local().clone()
    }

    pub fn callbacks_mut(&self) -> std::cell::RefMut<'_, Callbacks> {
        std::cell::RefMut::map(self.inner.borrow_mut(), |inner| &mut inner.callbacks)
    }

    /// Acquires local media (falling back to chat-only), then connects to
    /// the coordinator. The room is joined once the ICE configuration
    /// arrives.
    pub async fn start(&self) -> Result<(), JsValue> {
        Self::acquire_media(&self.inner).await;
        Self::ws_setup(&self.inner)?;
        Self::start_timeout_timer(&self.inner)?;
        Ok(())
    }

    pub fn send_chat(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let command = self.inner.borrow().mesh.chat(text);
        Self::run(&self.inner, vec![command]);
    }

    /// Closes every link, leaves the room, stops local tracks and the
    /// signaling socket. Safe to call more than once.
    pub fn leave(&self) {
        Self::teardown(&self.inner, true);
        Logger::info("Left the room");
    }

    /// Drops all room state. `announce` is false once the socket is already
    /// gone and a leave-room could not be delivered.
    pub(crate) fn teardown(inner: &Rc<RefCell<EngineInner>>, announce: bool) {
        let commands = inner.borrow_mut().mesh.leave();
        for command in commands {
            match command {
                MeshCommand::Send(msg) if announce => Self::send_now(inner, &msg),
                MeshCommand::CloseLink { remote_id } => Self::close_link(inner, &remote_id),
                other => Logger::debug(&format!("Skipping {:?} while leaving", other)),
            }
        }

        Self::stop_media(inner);

        let (ws, timer) = {
            let mut inner = inner.borrow_mut();
            (inner.ws.take(), inner.timeout_timer.take())
        };
        if let Some(timer) = timer
            && let Some(window) = web_sys::window()
        {
            window.clear_interval_with_handle(timer);
        }
        if let Some(ws) = ws {
            // Handlers go first so the close is not reported as a drop.
            ws.set_onclose(None);
            ws.set_onmessage(None);
            if let Err(e) = ws.close() {
                Logger::error("Closing signaling socket failed", &e);
            }
        }
    }

    pub(crate) fn now_ms() -> u64 {
        js_sys::Date::now() as u64
    }

    /// Executes mesh commands in the background, in order.
    pub(crate) fn run(inner: &Rc<RefCell<EngineInner>>, commands: Vec<MeshCommand>) {
        if commands.is_empty() {
            return;
        }
        let inner = inner.clone();
        wasm_bindgen_futures::spawn_local(async move {
            Self::execute(inner, commands).await;
        });
    }

    async fn execute(inner: Rc<RefCell<EngineInner>>, commands: Vec<MeshCommand>) {
        let mut queue = VecDeque::from(commands);
        while let Some(command) = queue.pop_front() {
            queue.extend(Self::execute_one(&inner, command).await);
        }
    }

    async fn execute_one(inner: &Rc<RefCell<EngineInner>>, command: MeshCommand) -> Vec<MeshCommand> {
        match command {
            MeshCommand::Send(msg) => {
                Self::send_now(inner, &msg);
                Vec::new()
            }
            MeshCommand::OpenLink {
                remote_id,
                remote_name,
            } => {
                Self::open_link(inner, remote_id, remote_name);
                Vec::new()
            }
            MeshCommand::CreateOffer {
                remote_id,
                ice_restart,
            } => Self::create_offer(inner, remote_id, ice_restart).await,
            MeshCommand::AcceptOffer { remote_id, sdp } => {
                Self::accept_offer(inner, remote_id, sdp).await
            }
            MeshCommand::ApplyAnswer { remote_id, sdp } => {
                Self::apply_answer(inner, remote_id, sdp).await
            }
            MeshCommand::AddIceCandidate {
                remote_id,
                candidate,
            } => {
                Self::add_candidate(inner, remote_id, candidate).await;
                Vec::new()
            }
            MeshCommand::CloseLink { remote_id } => {
                Self::close_link(inner, &remote_id);
                Vec::new()
            }
        }
    }

    pub(crate) fn send_now(inner: &Rc<RefCell<EngineInner>>, msg: &ClientMessage) {
        let json = match serde_json::to_string(msg) {
            Ok(json) => json,
            Err(e) => {
                Logger::warn(&format!("Failed to encode signaling message: {}", e));
                return;
            }
        };

        if let Some(ws) = &inner.borrow().ws
            && let Err(e) = ws.send_with_str(&json)
        {
            Logger::error("Signaling send failed", &e);
        }
    }

    pub(crate) fn close_link(inner: &Rc<RefCell<EngineInner>>, remote_id: &ParticipantId) {
        let removed = inner.borrow_mut().links.remove(remote_id);
        let Some(link) = removed else {
            return;
        };

        Logger::info(&format!("Closing link to {} ({})", remote_id, link.remote_name));
        link.pc.set_onicecandidate(None);
        link.pc.set_ontrack(None);
        link.pc.set_onconnectionstatechange(None);
        link.pc.set_onnegotiationneeded(None);
        link.pc.close();

        let callback = inner.borrow().callbacks.on_remote_left.clone();
        Callbacks::call(callback.as_ref(), &[JsValue::from_str(remote_id.as_str())]);
    }

    fn start_timeout_timer(inner: &Rc<RefCell<EngineInner>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

        let tick = {
            let inner = inner.clone();
            Closure::<dyn FnMut()>::new(move || {
                let commands = inner.borrow_mut().mesh.poll_timeouts(Self::now_ms());
                Self::run(&inner, commands);
            })
        };
        let handle = window.set_interval_with_callback_and_timeout_and_arguments_0(
            tick.as_ref().unchecked_ref(),
            TIMEOUT_POLL_MS,
        )?;
        tick.forget();

        inner.borrow_mut().timeout_timer = Some(handle);
        Ok(())
    }
}
