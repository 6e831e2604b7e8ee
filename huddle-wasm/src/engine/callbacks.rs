use wasm_bindgen::JsValue;

use crate::logger::Logger;

/// JavaScript handlers registered by the page. Each is invoked with the
/// engine borrow already released, so handlers may call back in.
#[derive(Default, Clone)]
pub struct Callbacks {
    /// `(stream)`
    pub on_local_stream: Option<js_sys::Function>,
    /// `(participantId, displayName, stream)`
    pub on_remote_stream: Option<js_sys::Function>,
    /// `(participantId)`
    pub on_remote_left: Option<js_sys::Function>,
    /// `(users)` with `users` as `[{id, displayName}]`
    pub on_joined: Option<js_sys::Function>,
    /// `(text, localTime)`
    pub on_notice: Option<js_sys::Function>,
    /// `(senderId, senderName, text, localTime, isLocal)`
    pub on_chat: Option<js_sys::Function>,
    /// `(message)`
    pub on_error: Option<js_sys::Function>,
}

impl Callbacks {
    pub(crate) fn call(callback: Option<&js_sys::Function>, args: &[JsValue]) {
        let Some(callback) = callback else {
            return;
        };
        let args: js_sys::Array = args.iter().collect();
        if let Err(e) = callback.apply(&JsValue::NULL, &args) {
            Logger::error("Page callback threw", &e);
        }
    }
}

/// Wall-clock time of day in the browser's locale.
pub(crate) fn local_time_now() -> String {
    js_sys::Date::new_0()
        .to_locale_time_string("default")
        .into()
}

/// `timestamp` (RFC 3339) rendered as local time of day.
pub(crate) fn local_time_of(timestamp: &str) -> String {
    js_sys::Date::new(&JsValue::from_str(timestamp))
        .to_locale_time_string("default")
        .into()
}

/// Best-effort text for a thrown JS value (`DOMException`, `Error` or string).
pub(crate) fn describe_js_error(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            js_sys::Reflect::get(err, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", err))
}
