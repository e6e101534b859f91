use serde_json::Value;

use crate::error::SkygearResult;

/// A secondary window opened for the provider's login page.
pub trait PopupWindow: Send + Sync {
    fn navigate(&self, url: &str) -> SkygearResult<()>;
    fn is_closed(&self) -> bool;
    fn close(&self);
}

/// The window that opened the current page, seen from inside a popup.
pub trait OpenerWindow: Send + Sync {
    fn post_message(&self, message: &Value, target_origin: &str) -> SkygearResult<()>;
}

/// Window operations the login coordinators need from the host environment.
pub trait BrowserHost: Send + Sync {
    /// Opens an empty popup window with the given window features.
    fn open_popup(&self, features: &str) -> SkygearResult<Box<dyn PopupWindow>>;

    /// Navigates the current window.
    fn navigate(&self, url: &str) -> SkygearResult<()>;

    /// `None` unless the current page runs inside a popup.
    fn opener(&self) -> Option<Box<dyn OpenerWindow>>;

    /// Closes the current window.
    fn close_window(&self);

    /// Starts receiving cross-window messages addressed to the current window.
    fn listen_for_messages(&self) -> SkygearResult<MessageListener>;
}

/// Detaches a message handler when dropped.
pub struct ListenerSubscription {
    cleanup: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl ListenerSubscription {
    pub fn new<F>(cleanup: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }
}

impl Drop for ListenerSubscription {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

/// Stream of message payloads. Dropping it removes the underlying handler.
pub struct MessageListener {
    receiver: async_channel::Receiver<Value>,
    _subscription: ListenerSubscription,
}

impl MessageListener {
    pub fn new(receiver: async_channel::Receiver<Value>, subscription: ListenerSubscription) -> Self {
        Self {
            receiver,
            _subscription: subscription,
        }
    }

    /// Next message, or `None` once the host stops delivering.
    pub async fn next(&mut self) -> Option<Value> {
        self.receiver.recv().await.ok()
    }
}

impl std::fmt::Debug for MessageListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageListener")
            .field("pending", &self.receiver.len())
            .finish_non_exhaustive()
    }
}
