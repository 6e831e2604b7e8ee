use std::cell::RefCell;
use std::rc::Rc;

use huddle_core::mesh::{ClientError, MeshCommand, SdpKind};
use huddle_core::{IceCandidate, ParticipantId};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

use crate::HuddleEngine;
use crate::engine::EngineInner;
use crate::engine::callbacks::{Callbacks, describe_js_error};
use crate::logger::Logger;

impl HuddleEngine {
    pub(super) async fn create_offer(
        inner: &Rc<RefCell<EngineInner>>,
        remote_id: ParticipantId,
        ice_restart: bool,
    ) -> Vec<MeshCommand> {
        let Some(pc) = Self::peer(inner, &remote_id) else {
            return Vec::new();
        };

        match make_offer(&pc, ice_restart).await {
            Ok(sdp) => {
                Logger::debug(&format!("Sending offer to {}", remote_id));
                inner
                    .borrow_mut()
                    .mesh
                    .on_local_description(&remote_id, SdpKind::Offer, sdp)
            }
            Err(e) => {
                Self::negotiation_failed(inner, remote_id, &e);
                Vec::new()
            }
        }
    }

    pub(super) async fn accept_offer(
        inner: &Rc<RefCell<EngineInner>>,
        remote_id: ParticipantId,
        sdp: String,
    ) -> Vec<MeshCommand> {
        let Some(pc) = Self::peer(inner, &remote_id) else {
            return Vec::new();
        };

        if let Err(e) = set_remote(&pc, web_sys::RtcSdpType::Offer, &sdp).await {
            Self::negotiation_failed(inner, remote_id, &e);
            return Vec::new();
        }
        let now = Self::now_ms();
        let mut follow_up = inner
            .borrow_mut()
            .mesh
            .on_remote_description_applied(&remote_id, now);

        match make_answer(&pc).await {
            Ok(answer) => {
                Logger::debug(&format!("Sending answer to {}", remote_id));
                let sent = inner
                    .borrow_mut()
                    .mesh
                    .on_local_description(&remote_id, SdpKind::Answer, answer);
                follow_up.extend(sent);
            }
            Err(e) => Self::negotiation_failed(inner, remote_id, &e),
        }
        follow_up
    }

    pub(super) async fn apply_answer(
        inner: &Rc<RefCell<EngineInner>>,
        remote_id: ParticipantId,
        sdp: String,
    ) -> Vec<MeshCommand> {
        let Some(pc) = Self::peer(inner, &remote_id) else {
            return Vec::new();
        };

        match set_remote(&pc, web_sys::RtcSdpType::Answer, &sdp).await {
            Ok(()) => {
                let now = Self::now_ms();
                inner
                    .borrow_mut()
                    .mesh
                    .on_remote_description_applied(&remote_id, now)
            }
            Err(e) => {
                Self::negotiation_failed(inner, remote_id, &e);
                Vec::new()
            }
        }
    }

    /// A rejected candidate is not fatal: other candidates may still pair.
    pub(super) async fn add_candidate(
        inner: &Rc<RefCell<EngineInner>>,
        remote_id: ParticipantId,
        candidate: IceCandidate,
    ) {
        let Some(pc) = Self::peer(inner, &remote_id) else {
            return;
        };

        let init = web_sys::RtcIceCandidateInit::new(&candidate.candidate);
        init.set_sdp_mid(candidate.sdp_mid.as_deref());
        init.set_sdp_m_line_index(candidate.sdp_m_line_index);
        if let Some(ufrag) = &candidate.username_fragment
            && let Err(e) = js_sys::Reflect::set(
                &init,
                &JsValue::from_str("usernameFragment"),
                &JsValue::from_str(ufrag),
            )
        {
            Logger::error("Could not set usernameFragment", &e);
        }

        let promise = pc.add_ice_candidate_with_opt_rtc_ice_candidate_init(Some(&init));
        if let Err(e) = JsFuture::from(promise).await {
            Logger::warn(&format!(
                "Error adding ICE candidate from {}: {}",
                remote_id,
                describe_js_error(&e)
            ));
        }
    }

    fn peer(
        inner: &Rc<RefCell<EngineInner>>,
        remote_id: &ParticipantId,
    ) -> Option<web_sys::RtcPeerConnection> {
        inner.borrow().links.get(remote_id).map(|link| link.pc.clone())
    }

    /// Marks only this link failed and tells the page.
    pub(super) fn negotiation_failed(
        inner: &Rc<RefCell<EngineInner>>,
        remote_id: ParticipantId,
        err: &JsValue,
    ) {
        let failure = ClientError::NegotiationFailure {
            remote_id,
            reason: describe_js_error(err),
        };
        inner.borrow_mut().mesh.on_negotiation_error(&failure);
        Logger::error(&failure.to_string(), err);

        let callback = inner.borrow().callbacks.on_error.clone();
        Callbacks::call(callback.as_ref(), &[JsValue::from_str(&failure.to_string())]);
    }
}

async fn make_offer(pc: &web_sys::RtcPeerConnection, ice_restart: bool) -> Result<String, JsValue> {
    let offer = if ice_restart {
        let options = web_sys::RtcOfferOptions::new();
        options.set_ice_restart(true);
        JsFuture::from(pc.create_offer_with_rtc_offer_options(&options)).await?
    } else {
        JsFuture::from(pc.create_offer()).await?
    };

    let sdp = sdp_of(&offer)?;
    let desc = web_sys::RtcSessionDescriptionInit::new(web_sys::RtcSdpType::Offer);
    desc.set_sdp(&sdp);
    JsFuture::from(pc.set_local_description(&desc)).await?;
    Ok(sdp)
}

async fn make_answer(pc: &web_sys::RtcPeerConnection) -> Result<String, JsValue> {
    let answer = JsFuture::from(pc.create_answer()).await?;

    let sdp = sdp_of(&answer)?;
    let desc = web_sys::RtcSessionDescriptionInit::new(web_sys::RtcSdpType::Answer);
    desc.set_sdp(&sdp);
    JsFuture::from(pc.set_local_description(&desc)).await?;
    Ok(sdp)
}

async fn set_remote(
    pc: &web_sys::RtcPeerConnection,
    kind: web_sys::RtcSdpType,
    sdp: &str,
) -> Result<(), JsValue> {
    let desc = web_sys::RtcSessionDescriptionInit::new(kind);
    desc.set_sdp(sdp);
    JsFuture::from(pc.set_remote_description(&desc)).await?;
    Ok(())
}

fn sdp_of(description: &JsValue) -> Result<String, JsValue> {
    js_sys::Reflect::get(description, &JsValue::from_str("sdp"))?
        .as_string()
        .ok_or_else(|| JsValue::from_str("session description without sdp"))
}
