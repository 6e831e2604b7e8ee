use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::{JsValue, prelude::Closure};
use web_sys::WebSocket;

use crate::HuddleEngine;
use crate::engine::EngineInner;
use crate::engine::callbacks::Callbacks;
use crate::logger::Logger;

impl HuddleEngine {
    pub(super) fn ws_setup(inner: &Rc<RefCell<EngineInner>>) -> Result<(), JsValue> {
        let url = inner.borrow().url.clone();
        let ws: WebSocket = WebSocket::new(&url)?;

        let onopen_callback = Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |_| {
            Logger::info("WS Open");
        }));
        ws.set_onopen(Some(onopen_callback.as_ref().unchecked_ref()));
        onopen_callback.forget();

        let onmessage_callback = {
            let inner = inner.clone();
            Closure::<dyn FnMut(web_sys::MessageEvent)>::wrap(Box::new(
                move |e: web_sys::MessageEvent| {
                    if let Ok(text) = e.data().dyn_into::<js_sys::JsString>() {
                        let text: String = text.into();
                        Logger::debug(&format!("WS IN: {}", text));
                        Self::handle_signal(&inner, text);
                    }
                },
            ))
        };
        ws.set_onmessage(Some(onmessage_callback.as_ref().unchecked_ref()));
        onmessage_callback.forget();

        let onclose_callback = {
            let inner = inner.clone();
            Closure::<dyn FnMut(web_sys::CloseEvent)>::wrap(Box::new(
                move |e: web_sys::CloseEvent| {
                    Logger::warn(&format!("WS Closed ({}): {}", e.code(), e.reason()));
                    inner.borrow_mut().ws = None;
                    // Nobody is left to tell; links and media go as on leave.
                    Self::teardown(&inner, false);
                    Self::notice(&inner, "Lost connection to the signaling server");
                    let callback = inner.borrow().callbacks.on_error.clone();
                    Callbacks::call(
                        callback.as_ref(),
                        &[JsValue::from_str("Signaling connection closed")],
                    );
                },
            ))
        };
        ws.set_onclose(Some(onclose_callback.as_ref().unchecked_ref()));
        onclose_callback.forget();

        let onerror_callback = Closure::<dyn FnMut(web_sys::ErrorEvent)>::wrap(Box::new(
            move |e: web_sys::ErrorEvent| {
                Logger::error("WS Error", &e.into());
            },
        ));
        ws.set_onerror(Some(onerror_callback.as_ref().unchecked_ref()));
        onerror_callback.forget();

        inner.borrow_mut().ws = Some(ws);
        Ok(())
    }
}
