use serde_json::Value;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{EventTarget, HtmlDocument, MessageEvent, Window};

use crate::error::{platform_error, SkygearError, SkygearResult};
use crate::sso::browser::{BrowserHost, ListenerSubscription, MessageListener, OpenerWindow, PopupWindow};
use crate::sso::cookie;
use crate::sso::transient::TransientStateStore;

use super::api::LOGGER;

/// [`BrowserHost`] backed by the page's `window`.
#[derive(Clone, Debug, Default)]
pub struct WebBrowserHost;

impl WebBrowserHost {
    pub fn new() -> Self {
        Self
    }
}

fn window() -> SkygearResult<Window> {
    web_sys::window().ok_or_else(|| platform_error("window is not available"))
}

fn map_js_error(err: JsValue) -> SkygearError {
    platform_error(stringify_js_error(err))
}

fn stringify_js_error(err: JsValue) -> String {
    if let Some(string) = err.as_string() {
        return string;
    }
    if let Ok(stringified) = js_sys::JSON::stringify(&err) {
        if let Some(text) = stringified.as_string() {
            return text;
        }
    }
    format!("{err:?}")
}

fn js_to_json(value: &JsValue) -> Option<Value> {
    let text = js_sys::JSON::stringify(value).ok()?.as_string()?;
    serde_json::from_str(&text).ok()
}

fn json_to_js(value: &Value) -> SkygearResult<JsValue> {
    js_sys::JSON::parse(&value.to_string()).map_err(map_js_error)
}

struct WebPopup {
    window: Window,
}

// wasm32 without threads: window handles never cross threads.
unsafe impl Send for WebPopup {}
unsafe impl Sync for WebPopup {}

impl PopupWindow for WebPopup {
    fn navigate(&self, url: &str) -> SkygearResult<()> {
        self.window.location().set_href(url).map_err(map_js_error)
    }

    fn is_closed(&self) -> bool {
        self.window.closed().unwrap_or(true)
    }

    fn close(&self) {
        if let Err(err) = self.window.close() {
            LOGGER.warn(format!("Failed to close popup: {}", stringify_js_error(err)));
        }
    }
}

struct WebOpener {
    window: Window,
}

unsafe impl Send for WebOpener {}
unsafe impl Sync for WebOpener {}

impl OpenerWindow for WebOpener {
    fn post_message(&self, message: &Value, target_origin: &str) -> SkygearResult<()> {
        let message = json_to_js(message)?;
        self.window
            .post_message(&message, target_origin)
            .map_err(map_js_error)
    }
}

struct MessageHandlerHandle {
    target: EventTarget,
    callback: Closure<dyn FnMut(MessageEvent)>,
}

unsafe impl Send for MessageHandlerHandle {}

impl Drop for MessageHandlerHandle {
    fn drop(&mut self) {
        if let Err(err) = self
            .target
            .remove_event_listener_with_callback("message", self.callback.as_ref().unchecked_ref())
        {
            LOGGER.warn(format!(
                "removeEventListener failed: {}",
                stringify_js_error(err)
            ));
        }
    }
}

impl BrowserHost for WebBrowserHost {
    fn open_popup(&self, features: &str) -> SkygearResult<Box<dyn PopupWindow>> {
        let popup = window()?
            .open_with_url_and_target_and_features("", "_blank", features)
            .map_err(map_js_error)?
            .ok_or_else(|| platform_error("popup blocked"))?;
        Ok(Box::new(WebPopup { window: popup }))
    }

    fn navigate(&self, url: &str) -> SkygearResult<()> {
        window()?.location().set_href(url).map_err(map_js_error)
    }

    fn opener(&self) -> Option<Box<dyn OpenerWindow>> {
        let window = opener_window(window().ok()?.opener().ok()?)?;
        Some(Box::new(WebOpener { window }))
    }

    fn close_window(&self) {
        match window() {
            Ok(window) => {
                if let Err(err) = window.close() {
                    LOGGER.warn(format!("Failed to close window: {}", stringify_js_error(err)));
                }
            }
            Err(err) => LOGGER.warn(format!("Failed to close window: {err}")),
        }
    }

    fn listen_for_messages(&self) -> SkygearResult<MessageListener> {
        let target: EventTarget = window()?.into();
        let (sender, receiver) = async_channel::unbounded();
        let callback = Closure::wrap(Box::new(move |event: MessageEvent| {
            match js_to_json(&event.data()) {
                Some(data) => {
                    let _ = sender.try_send(data);
                }
                None => LOGGER.debug("ignoring message that is not JSON"),
            }
        }) as Box<dyn FnMut(MessageEvent)>);

        target
            .add_event_listener_with_callback("message", callback.as_ref().unchecked_ref())
            .map_err(map_js_error)?;
        let handle = MessageHandlerHandle { target, callback };

        Ok(MessageListener::new(
            receiver,
            ListenerSubscription::new(move || drop(handle)),
        ))
    }
}

/// `window.opener` as a [`Window`], or `None` outside a popup.
///
/// The opener is a WindowProxy from another realm, so the `instanceof Window`
/// check behind `dyn_into` is always false for it.
fn opener_window(opener: JsValue) -> Option<Window> {
    if opener.is_null() || opener.is_undefined() {
        return None;
    }
    Some(opener.unchecked_into::<Window>())
}

/// [`TransientStateStore`] over `document.cookie`.
#[derive(Clone, Debug, Default)]
pub struct CookieTransientState;

impl CookieTransientState {
    pub fn new() -> Self {
        Self
    }

    fn document() -> SkygearResult<HtmlDocument> {
        window()?
            .document()
            .ok_or_else(|| platform_error("document is not available"))?
            .dyn_into::<HtmlDocument>()
            .map_err(|_| platform_error("document is not an HTML document"))
    }
}

impl TransientStateStore for CookieTransientState {
    fn take(&self, key: &str) -> SkygearResult<Option<String>> {
        let document = Self::document()?;
        let header = document.cookie().map_err(map_js_error)?;
        let value = cookie::read(&header, key);
        if value.is_some() {
            document
                .set_cookie(&cookie::remove_assignment(key))
                .map_err(map_js_error)?;
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> SkygearResult<()> {
        Self::document()?
            .set_cookie(&cookie::set_assignment(key, value))
            .map_err(map_js_error)
    }
}

#[cfg(all(test, feature = "wasm-web", target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn missing_opener_is_none() {
        assert!(opener_window(JsValue::NULL).is_none());
        assert!(opener_window(JsValue::UNDEFINED).is_none());
    }

    #[wasm_bindgen_test]
    fn opener_from_another_realm_is_accepted() {
        // Stands in for a cross-realm WindowProxy: not an instance of this
        // realm's `Window`.
        let foreign: JsValue = js_sys::Object::new().into();
        assert!(!foreign.is_instance_of::<Window>());
        assert!(opener_window(foreign).is_some());
    }

    #[wasm_bindgen_test]
    fn own_window_is_accepted() {
        let own: JsValue = web_sys::window().unwrap().into();
        assert!(opener_window(own).is_some());
    }
}
