use std::cell::RefCell;
use std::rc::Rc;

use huddle_core::mesh::ClientError;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::engine::callbacks::{Callbacks, describe_js_error, local_time_now};
use crate::engine::{EngineInner, HuddleEngine};
use crate::logger::Logger;

impl HuddleEngine {
    /// Asks for camera and microphone. Any failure leaves the participant
    /// chat-only; joining still goes ahead.
    pub(super) async fn acquire_media(inner: &Rc<RefCell<EngineInner>>) {
        match Self::get_user_media().await {
            Ok(stream) => {
                Logger::info("Local media acquired");
                inner.borrow_mut().local_stream = Some(stream.clone());
                let callback = inner.borrow().callbacks.on_local_stream.clone();
                Callbacks::call(callback.as_ref(), &[stream.into()]);
            }
            Err(e) => {
                let error = ClientError::MediaUnavailable(describe_js_error(&e));
                Logger::warn(&error.to_string());
                Self::notice(inner, "Camera and microphone unavailable, joining with chat only");
                let callback = inner.borrow().callbacks.on_error.clone();
                Callbacks::call(callback.as_ref(), &[JsValue::from_str(&error.to_string())]);
            }
        }
    }

    /// Retries media after a chat-only start and adds the new tracks to every
    /// open link. Links this side initiated renegotiate on their own.
    pub async fn publish_media(&self) -> Result<(), JsValue> {
        if self.inner.borrow().local_stream.is_some() {
            return Ok(());
        }

        Self::acquire_media(&self.inner).await;
        let Some(stream) = self.inner.borrow().local_stream.clone() else {
            return Err(JsValue::from_str("Camera and microphone unavailable"));
        };

        let pcs: Vec<web_sys::RtcPeerConnection> = self
            .inner
            .borrow()
            .links
            .values()
            .map(|link| link.pc.clone())
            .collect();
        for pc in pcs {
            for track in stream.get_tracks().iter() {
                let track: web_sys::MediaStreamTrack = track.unchecked_into();
                pc.add_track_0(&track, &stream);
            }
        }
        Ok(())
    }

    async fn get_user_media() -> Result<web_sys::MediaStream, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let devices = window.navigator().media_devices()?;

        let constraints = web_sys::MediaStreamConstraints::new();
        constraints.set_audio(&JsValue::TRUE);
        constraints.set_video(&JsValue::TRUE);

        let stream = JsFuture::from(devices.get_user_media_with_constraints(&constraints)?).await?;
        stream.dyn_into::<web_sys::MediaStream>()
    }

    /// Enables or disables every local track of `kind` (`"audio"` or
    /// `"video"`). Returns how many tracks were touched.
    pub fn set_tracks_enabled(&self, kind: &str, enabled: bool) -> u32 {
        let Some(stream) = self.inner.borrow().local_stream.clone() else {
            return 0;
        };

        let mut touched = 0;
        for track in stream.get_tracks().iter() {
            let Ok(track) = track.dyn_into::<web_sys::MediaStreamTrack>() else {
                continue;
            };
            if track.kind() == kind {
                track.set_enabled(enabled);
                touched += 1;
            }
        }
        Logger::info(&format!(
            "{} {} local {} track(s)",
            if enabled { "Enabled" } else { "Disabled" },
            touched,
            kind
        ));
        touched
    }

    pub(super) fn stop_media(inner: &Rc<RefCell<EngineInner>>) {
        let Some(stream) = inner.borrow_mut().local_stream.take() else {
            return;
        };
        for track in stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<web_sys::MediaStreamTrack>() {
                track.stop();
            }
        }
        Logger::info("Local media stopped");
    }

    pub(super) fn notice(inner: &Rc<RefCell<EngineInner>>, text: &str) {
        let callback = inner.borrow().callbacks.on_notice.clone();
        Callbacks::call(
            callback.as_ref(),
            &[JsValue::from_str(text), JsValue::from_str(&local_time_now())],
        );
    }
}
