use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::{platform_error, SkygearResult};
use crate::sso::browser::{BrowserHost, ListenerSubscription, MessageListener, OpenerWindow, PopupWindow};

/// Headless [`BrowserHost`] that records window operations.
///
/// Used on targets without a DOM and to drive the login flows in tests:
/// [`InMemoryBrowserHost::post_message`] delivers a payload to every active
/// listener and [`InMemoryPopup::simulate_close`] closes a popup.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBrowserHost {
    state: Arc<Mutex<HostState>>,
}

#[derive(Debug, Default)]
struct HostState {
    popups: Vec<Arc<InMemoryPopup>>,
    navigations: Vec<String>,
    posted: Vec<(Value, String)>,
    listeners: Vec<(u64, async_channel::Sender<Value>)>,
    next_listener_id: u64,
    has_opener: bool,
    window_closed: bool,
    block_popups: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryPopup {
    features: String,
    location: Mutex<Option<String>>,
    closed: AtomicBool,
}

impl InMemoryPopup {
    pub fn features(&self) -> &str {
        &self.features
    }

    pub fn location(&self) -> Option<String> {
        self.location.lock().unwrap().clone()
    }

    pub fn simulate_close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl PopupWindow for Arc<InMemoryPopup> {
    fn navigate(&self, url: &str) -> SkygearResult<()> {
        *self.location.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.simulate_close();
    }
}

struct InMemoryOpener {
    state: Arc<Mutex<HostState>>,
}

impl OpenerWindow for InMemoryOpener {
    fn post_message(&self, message: &Value, target_origin: &str) -> SkygearResult<()> {
        self.state
            .lock()
            .unwrap()
            .posted
            .push((message.clone(), target_origin.to_string()));
        Ok(())
    }
}

impl InMemoryBrowserHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose current window was opened as a popup.
    pub fn with_opener() -> Self {
        let host = Self::default();
        host.state.lock().unwrap().has_opener = true;
        host
    }

    /// Makes every later `open_popup` fail, like a browser popup blocker.
    pub fn block_popups(&self) {
        self.state.lock().unwrap().block_popups = true;
    }

    /// Delivers `message` to every active listener; returns how many received it.
    pub fn post_message(&self, message: Value) -> usize {
        let listeners: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .listeners
            .iter()
            .map(|(_, sender)| sender.clone())
            .collect();
        listeners
            .iter()
            .filter(|sender| sender.try_send(message.clone()).is_ok())
            .count()
    }

    pub fn popups(&self) -> Vec<Arc<InMemoryPopup>> {
        self.state.lock().unwrap().popups.clone()
    }

    pub fn last_popup(&self) -> Option<Arc<InMemoryPopup>> {
        self.state.lock().unwrap().popups.last().cloned()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    /// Messages posted to the opener, with their target origins.
    pub fn posted_messages(&self) -> Vec<(Value, String)> {
        self.state.lock().unwrap().posted.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().unwrap().listeners.len()
    }

    pub fn is_window_closed(&self) -> bool {
        self.state.lock().unwrap().window_closed
    }
}

impl BrowserHost for InMemoryBrowserHost {
    fn open_popup(&self, features: &str) -> SkygearResult<Box<dyn PopupWindow>> {
        let mut state = self.state.lock().unwrap();
        if state.block_popups {
            return Err(platform_error("popup blocked"));
        }
        let popup = Arc::new(InMemoryPopup {
            features: features.to_string(),
            ..Default::default()
        });
        state.popups.push(popup.clone());
        Ok(Box::new(popup))
    }

    fn navigate(&self, url: &str) -> SkygearResult<()> {
        self.state.lock().unwrap().navigations.push(url.to_string());
        Ok(())
    }

    fn opener(&self) -> Option<Box<dyn OpenerWindow>> {
        let has_opener = self.state.lock().unwrap().has_opener;
        has_opener.then(|| {
            Box::new(InMemoryOpener {
                state: self.state.clone(),
            }) as Box<dyn OpenerWindow>
        })
    }

    fn close_window(&self) {
        self.state.lock().unwrap().window_closed = true;
    }

    fn listen_for_messages(&self) -> SkygearResult<MessageListener> {
        let (sender, receiver) = async_channel::unbounded();
        let id = {
            let mut state = self.state.lock().unwrap();
            let id = state.next_listener_id;
            state.next_listener_id += 1;
            state.listeners.push((id, sender));
            id
        };
        let state = self.state.clone();
        let subscription = ListenerSubscription::new(move || {
            state
                .lock()
                .unwrap()
                .listeners
                .retain(|(listener_id, _)| *listener_id != id);
        });
        Ok(MessageListener::new(receiver, subscription))
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(flavor = "current_thread")]
    async fn messages_reach_only_live_listeners() {
        let host = InMemoryBrowserHost::new();
        let mut listener = host.listen_for_messages().unwrap();
        assert_eq!(host.post_message(json!("hi")), 1);
        assert_eq!(listener.next().await, Some(json!("hi")));

        drop(listener);
        assert_eq!(host.listener_count(), 0);
        assert_eq!(host.post_message(json!("late")), 0);
    }

    #[test]
    fn opener_is_only_present_inside_popups() {
        assert!(InMemoryBrowserHost::new().opener().is_none());

        let host = InMemoryBrowserHost::with_opener();
        host.opener()
            .unwrap()
            .post_message(&json!({"ok": true}), "https://app.example.com")
            .unwrap();
        assert_eq!(
            host.posted_messages(),
            vec![(json!({"ok": true}), "https://app.example.com".to_string())]
        );
    }
}
