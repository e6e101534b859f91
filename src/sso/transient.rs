use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::SkygearResult;

/// Post-login redirect target stashed by the server.
pub const SSO_CALLBACK_URL_KEY: &str = "sso_callback_url";
/// Base64-encoded JSON login result stashed by the server.
pub const SSO_RESULT_KEY: &str = "sso_result";

/// Short-lived key/value channel shared with the server (cookies in a browser).
///
/// Values are read once: [`TransientStateStore::take`] removes what it returns.
pub trait TransientStateStore: Send + Sync {
    fn take(&self, key: &str) -> SkygearResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> SkygearResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryTransientState {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryTransientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().unwrap().contains_key(key)
    }
}

impl TransientStateStore for InMemoryTransientState {
    fn take(&self, key: &str) -> SkygearResult<Option<String>> {
        Ok(self.values.lock().unwrap().remove(key))
    }

    fn set(&self, key: &str, value: &str) -> SkygearResult<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_reads_once() {
        let state = InMemoryTransientState::new();
        state.set(SSO_CALLBACK_URL_KEY, "https://app.example.com/cb").unwrap();

        assert_eq!(
            state.take(SSO_CALLBACK_URL_KEY).unwrap().as_deref(),
            Some("https://app.example.com/cb")
        );
        assert!(state.take(SSO_CALLBACK_URL_KEY).unwrap().is_none());
        assert!(!state.contains(SSO_CALLBACK_URL_KEY));
    }
}
