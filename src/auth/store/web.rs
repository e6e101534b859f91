use std::sync::Arc;

use async_trait::async_trait;
use wasm_bindgen::JsValue;
use web_sys::{Storage, Window};

use crate::auth::store::Store;
use crate::error::{store_error, SkygearError, SkygearResult};

const DEFAULT_KEY_PREFIX: &str = "";

/// Persists items in `window.localStorage`.
///
/// An optional prefix namespaces the keys so several containers can share an
/// origin; `keys()` only reports (and purging only touches) prefixed entries.
#[derive(Debug, Clone)]
pub struct WebStorageStore {
    prefix: Arc<String>,
}

impl Default for WebStorageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WebStorageStore {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Arc::new(prefix.into()),
        }
    }

    fn storage() -> SkygearResult<Storage> {
        let window: Window = web_sys::window()
            .ok_or_else(|| store_error("window object is not available in this environment"))?;
        window
            .local_storage()
            .map_err(map_js_error)?
            .ok_or_else(|| store_error("Web storage API is unavailable"))
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait(?Send)]
impl Store for WebStorageStore {
    async fn get_item(&self, key: &str) -> SkygearResult<Option<String>> {
        Self::storage()?
            .get_item(&self.storage_key(key))
            .map_err(map_js_error)
    }

    async fn set_item(&self, key: &str, value: &str) -> SkygearResult<()> {
        Self::storage()?
            .set_item(&self.storage_key(key), value)
            .map_err(map_js_error)
    }

    async fn remove_item(&self, key: &str) -> SkygearResult<()> {
        Self::storage()?
            .remove_item(&self.storage_key(key))
            .map_err(map_js_error)
    }

    async fn keys(&self) -> SkygearResult<Vec<String>> {
        let storage = Self::storage()?;
        let length = storage.length().map_err(map_js_error)?;
        let mut keys = Vec::new();
        for index in 0..length {
            if let Some(key) = storage.key(index).map_err(map_js_error)? {
                if let Some(stripped) = key.strip_prefix(self.prefix.as_str()) {
                    keys.push(stripped.to_string());
                }
            }
        }
        Ok(keys)
    }
}

fn map_js_error(err: JsValue) -> SkygearError {
    let message = err
        .as_string()
        .or_else(|| {
            js_sys::JSON::stringify(&err)
                .ok()
                .and_then(|text| text.as_string())
        })
        .unwrap_or_else(|| format!("{err:?}"));
    store_error(format!("Web storage error: {message}"))
}
