//! Platform capability bundle and runtime helpers.

pub mod runtime;

use std::fmt;
use std::sync::Arc;

use crate::auth::store::{InMemoryStore, Store};
use crate::push::{PushRegistrar, StorePushRegistrar};

/// Store and push implementations chosen once when the container is built.
#[derive(Clone)]
pub struct Platform {
    store: Arc<dyn Store>,
    push: Arc<dyn PushRegistrar>,
}

impl Platform {
    pub fn new(store: Arc<dyn Store>, push: Arc<dyn PushRegistrar>) -> Self {
        Self { store, push }
    }

    /// Uses `store` for both session persistence and the push device id.
    pub fn with_store(store: Arc<dyn Store>) -> Self {
        let push = Arc::new(StorePushRegistrar::new(store.clone()));
        Self { store, push }
    }

    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(InMemoryStore::new()))
    }

    /// Session and device id persisted to a JSON file.
    #[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
    pub fn file(path: impl AsRef<std::path::Path>) -> Self {
        Self::with_store(Arc::new(crate::auth::store::FileStore::new(path)))
    }

    /// Session and device id persisted to `window.localStorage`.
    #[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
    pub fn web() -> Self {
        Self::with_store(Arc::new(crate::auth::store::WebStorageStore::new()))
    }

    pub fn store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    pub fn push(&self) -> Arc<dyn PushRegistrar> {
        self.push.clone()
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}
