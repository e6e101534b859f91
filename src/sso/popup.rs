use std::time::Duration;

use futures::future::{select, Either};
use serde_json::Value;

use crate::error::{platform_error, SkygearError, SkygearResult};
use crate::platform::runtime;
use crate::sso::browser::{BrowserHost, MessageListener, PopupWindow};

use super::api::LOGGER;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);
pub const DEFAULT_WINDOW_FEATURES: &str = "height=700,width=500";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopupOptions {
    /// How often the popup is checked for having been closed.
    pub poll_interval: Duration,
    pub window_features: String,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            window_features: DEFAULT_WINDOW_FEATURES.to_string(),
        }
    }
}

/// A login popup. Every terminal operation consumes the handle.
pub struct PopupHandle {
    window: Box<dyn PopupWindow>,
}

impl std::fmt::Debug for PopupHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopupHandle")
            .field("closed", &self.window.is_closed())
            .finish()
    }
}

impl PopupHandle {
    pub fn open(host: &dyn BrowserHost, options: &PopupOptions) -> SkygearResult<Self> {
        let window = host.open_popup(&options.window_features)?;
        Ok(Self { window })
    }

    pub fn navigate(&self, url: &str) -> SkygearResult<()> {
        self.window.navigate(url)
    }

    pub fn close(self) {
        self.window.close();
    }

    /// Waits for the first message or for the popup to be closed.
    ///
    /// The observer that loses is dropped before this returns: its poll timer
    /// stops and the message handler is detached.
    pub async fn wait_for_result(
        self,
        mut listener: MessageListener,
        poll_interval: Duration,
    ) -> SkygearResult<Value> {
        let outcome = {
            let message_watch = Box::pin(listener.next());
            let closed_watch = Box::pin(watch_closed(self.window.as_ref(), poll_interval));
            match select(message_watch, closed_watch).await {
                Either::Left((message, closed_watch)) => {
                    drop(closed_watch);
                    match message {
                        Some(message) => Ok(message),
                        None => Err(platform_error("message channel closed before a login result arrived")),
                    }
                }
                Either::Right(((), message_watch)) => {
                    drop(message_watch);
                    Err(SkygearError::UserCancelled)
                }
            }
        };
        drop(listener);

        match &outcome {
            Ok(_) => LOGGER.debug("popup login result received"),
            Err(err) => LOGGER.debug(format!("popup login ended without result: {err}")),
        }
        outcome
    }
}

async fn watch_closed(window: &dyn PopupWindow, poll_interval: Duration) {
    loop {
        runtime::sleep(poll_interval).await;
        if window.is_closed() {
            return;
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::sso::memory::InMemoryBrowserHost;
    use serde_json::json;

    const POLL: Duration = Duration::from_millis(10);

    fn open(host: &InMemoryBrowserHost) -> (PopupHandle, MessageListener) {
        let popup = PopupHandle::open(host, &PopupOptions::default()).unwrap();
        let listener = host.listen_for_messages().unwrap();
        (popup, listener)
    }

    #[test]
    fn opens_with_default_window_features() {
        let host = InMemoryBrowserHost::new();
        let _popup = PopupHandle::open(&host, &PopupOptions::default()).unwrap();
        assert_eq!(host.last_popup().unwrap().features(), "height=700,width=500");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn message_first_wins_and_later_close_is_ignored() {
        let host = InMemoryBrowserHost::new();
        let (popup, listener) = open(&host);
        let window = host.last_popup().unwrap();

        host.post_message(json!({"result": {"access_token": "tok"}}));
        window.simulate_close();

        let result = popup.wait_for_result(listener, POLL).await.unwrap();
        assert_eq!(result, json!({"result": {"access_token": "tok"}}));
        assert_eq!(host.listener_count(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn close_first_cancels_and_later_message_is_dropped() {
        let host = InMemoryBrowserHost::new();
        let (popup, listener) = open(&host);
        host.last_popup().unwrap().simulate_close();

        let err = popup.wait_for_result(listener, POLL).await.unwrap_err();
        assert_eq!(err, SkygearError::UserCancelled);
        assert_eq!(host.listener_count(), 0);
        assert_eq!(host.post_message(json!({"late": true})), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn message_arriving_while_polling_resolves() {
        let host = InMemoryBrowserHost::new();
        let (popup, listener) = open(&host);
        let sender = host.clone();

        let (result, _) = futures::join!(popup.wait_for_result(listener, POLL), async move {
            runtime::sleep(POLL * 3).await;
            sender.post_message(json!("done"));
        });

        assert_eq!(result.unwrap(), json!("done"));
        assert!(!host.last_popup().unwrap().is_closed());
    }
}
