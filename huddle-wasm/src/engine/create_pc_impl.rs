use std::cell::RefCell;
use std::rc::Rc;

use huddle_core::mesh::{LinkState, Role};
use huddle_core::{IceCandidate, ParticipantId};
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;

use crate::HuddleEngine;
use crate::engine::callbacks::Callbacks;
use crate::engine::{EngineInner, RemoteLink};
use crate::logger::Logger;

const DATA_CHANNEL_LABEL: &str = "huddle";

impl HuddleEngine {
    /// Creates the peer connection toward `remote_id` with the role the mesh
    /// assigned. A connection already present for that remote is replaced.
    pub(super) fn open_link(
        inner: &Rc<RefCell<EngineInner>>,
        remote_id: ParticipantId,
        remote_name: String,
    ) {
        let role = inner.borrow().mesh.link(&remote_id).map(|link| link.role());
        let Some(role) = role else {
            return;
        };

        let generation = {
            let mut inner = inner.borrow_mut();
            inner.next_generation += 1;
            inner.next_generation
        };

        let pc = match Self::create_pc(inner, &remote_id, generation, role) {
            Ok(pc) => pc,
            Err(e) => {
                Self::negotiation_failed(inner, remote_id, &e);
                return;
            }
        };

        Logger::info(&format!(
            "Opened link to {} ({}) as {:?}",
            remote_id, remote_name, role
        ));
        let replaced = inner.borrow_mut().links.insert(
            remote_id,
            RemoteLink {
                pc,
                generation,
                remote_name,
            },
        );
        if let Some(previous) = replaced {
            previous.pc.set_onicecandidate(None);
            previous.pc.set_ontrack(None);
            previous.pc.set_onconnectionstatechange(None);
            previous.pc.set_onnegotiationneeded(None);
            previous.pc.close();
        }
    }

    fn create_pc(
        inner: &Rc<RefCell<EngineInner>>,
        remote_id: &ParticipantId,
        generation: u64,
        role: Role,
    ) -> Result<web_sys::RtcPeerConnection, JsValue> {
        let rtc_config = web_sys::RtcConfiguration::new();
        let ice_servers_arr = js_sys::Array::new();
        for server_config in &inner.borrow().ice_servers {
            let rtc_ice_server = web_sys::RtcIceServer::new();

            let urls = js_sys::Array::new();
            for url in &server_config.urls {
                urls.push(&JsValue::from_str(url));
            }
            rtc_ice_server.set_urls(&urls);

            if let Some(username) = &server_config.username {
                rtc_ice_server.set_username(username);
            }
            if let Some(credential) = &server_config.credential {
                rtc_ice_server.set_credential(credential);
            }

            ice_servers_arr.push(&rtc_ice_server);
        }
        rtc_config.set_ice_servers(&ice_servers_arr);

        let pc = web_sys::RtcPeerConnection::new_with_configuration(&rtc_config)?;

        let local_stream = inner.borrow().local_stream.clone();
        match local_stream {
            Some(stream) => {
                for track in stream.get_tracks().iter() {
                    let track: web_sys::MediaStreamTrack = track.unchecked_into();
                    pc.add_track_0(&track, &stream);
                }
            }
            None if role == Role::Initiator => {
                // Chat-only offerer: still ask for the remote's media.
                let init = web_sys::RtcRtpTransceiverInit::new();
                init.set_direction(web_sys::RtcRtpTransceiverDirection::Recvonly);
                pc.add_transceiver_with_str_and_init("audio", &init);
                pc.add_transceiver_with_str_and_init("video", &init);
            }
            None => {}
        }

        if role == Role::Initiator {
            let dc = pc.create_data_channel(DATA_CHANNEL_LABEL);
            Logger::debug(&format!("Created DataChannel '{}'", dc.label()));
        }

        let onice = {
            let inner = inner.clone();
            let remote_id = remote_id.clone();
            Closure::wrap(Box::new(move |ev: web_sys::RtcPeerConnectionIceEvent| {
                let Some(candidate) = ev.candidate() else {
                    return;
                };
                // An empty candidate marks the end of gathering.
                if candidate.candidate().is_empty() || !is_current(&inner, &remote_id, generation) {
                    return;
                }

                let candidate = IceCandidate {
                    candidate: candidate.candidate(),
                    sdp_mid: candidate.sdp_mid(),
                    sdp_m_line_index: candidate.sdp_m_line_index(),
                    username_fragment: username_fragment(&candidate),
                };
                let commands = inner
                    .borrow_mut()
                    .mesh
                    .on_local_candidate(&remote_id, candidate);
                Self::run(&inner, commands);
            }) as Box<dyn FnMut(web_sys::RtcPeerConnectionIceEvent)>)
        };
        pc.set_onicecandidate(Some(onice.as_ref().unchecked_ref()));
        onice.forget();

        let onstate = {
            let inner = inner.clone();
            let remote_id = remote_id.clone();
            let pc = pc.clone();
            Closure::wrap(Box::new(move |_: JsValue| {
                if !is_current(&inner, &remote_id, generation) {
                    return;
                }
                let Some(state) = link_state(pc.connection_state()) else {
                    return;
                };

                Logger::info(&format!("Link to {} is {}", remote_id, state));
                let now = Self::now_ms();
                let commands = inner
                    .borrow_mut()
                    .mesh
                    .on_connection_state(&remote_id, state, now);
                Self::run(&inner, commands);
            }) as Box<dyn FnMut(JsValue)>)
        };
        pc.set_onconnectionstatechange(Some(onstate.as_ref().unchecked_ref()));
        onstate.forget();

        let ontrack = {
            let inner = inner.clone();
            let remote_id = remote_id.clone();
            Closure::wrap(Box::new(move |ev: web_sys::RtcTrackEvent| {
                let (callback, remote_name) = {
                    let inner = inner.borrow();
                    let Some(link) = inner.links.get(&remote_id) else {
                        return;
                    };
                    if link.generation != generation {
                        return;
                    }
                    (
                        inner.callbacks.on_remote_stream.clone(),
                        link.remote_name.clone(),
                    )
                };

                let Ok(stream) = ev.streams().get(0).dyn_into::<web_sys::MediaStream>() else {
                    Logger::debug(&format!("Track from {} without a stream", remote_id));
                    return;
                };
                Callbacks::call(
                    callback.as_ref(),
                    &[
                        JsValue::from_str(remote_id.as_str()),
                        JsValue::from_str(&remote_name),
                        stream.into(),
                    ],
                );
            }) as Box<dyn FnMut(web_sys::RtcTrackEvent)>)
        };
        pc.set_ontrack(Some(ontrack.as_ref().unchecked_ref()));
        ontrack.forget();

        // The first handshake is driven by the mesh; only track changes on a
        // connected link go through here.
        let onnegotiation = {
            let inner = inner.clone();
            let remote_id = remote_id.clone();
            Closure::wrap(Box::new(move |_: JsValue| {
                if !is_current(&inner, &remote_id, generation) {
                    return;
                }
                let commands = {
                    let mut inner = inner.borrow_mut();
                    let connected = inner
                        .mesh
                        .link(&remote_id)
                        .is_some_and(|link| link.state() == LinkState::Connected);
                    if !connected {
                        return;
                    }
                    inner.mesh.renegotiate(&remote_id, Self::now_ms())
                };
                Self::run(&inner, commands);
            }) as Box<dyn FnMut(JsValue)>)
        };
        pc.set_onnegotiationneeded(Some(onnegotiation.as_ref().unchecked_ref()));
        onnegotiation.forget();

        Ok(pc)
    }
}

fn is_current(inner: &Rc<RefCell<EngineInner>>, remote_id: &ParticipantId, generation: u64) -> bool {
    inner
        .borrow()
        .links
        .get(remote_id)
        .is_some_and(|link| link.generation == generation)
}

fn username_fragment(candidate: &web_sys::RtcIceCandidate) -> Option<String> {
    js_sys::Reflect::get(candidate, &JsValue::from_str("usernameFragment"))
        .ok()
        .and_then(|ufrag| ufrag.as_string())
}

fn link_state(state: web_sys::RtcPeerConnectionState) -> Option<LinkState> {
    use web_sys::RtcPeerConnectionState as S;
    match state {
        S::New => Some(LinkState::New),
        S::Connecting => Some(LinkState::Negotiating),
        S::Connected => Some(LinkState::Connected),
        S::Disconnected => Some(LinkState::Disconnected),
        S::Failed => Some(LinkState::Failed),
        S::Closed => Some(LinkState::Closed),
        _ => None,
    }
}
