use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::auth::model::CurrentUser;
use crate::error::{store_error, SkygearResult};

pub const ACCESS_TOKEN_KEY: &str = "skygear-accesstoken";
pub const CURRENT_USER_KEY: &str = "skygear-user";
pub const DEVICE_ID_KEY: &str = "skygear-deviceid";

/// Keys that survive [`Store::clear_purgeable_items`].
pub const NON_PURGEABLE_KEYS: &[&str] = &[ACCESS_TOKEN_KEY, CURRENT_USER_KEY, DEVICE_ID_KEY];

/// Key/value backend the container persists session and cache data into.
///
/// Implementations only provide the item primitives; session helpers and
/// cache purging are built on top of them.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Store: Send + Sync {
    async fn get_item(&self, key: &str) -> SkygearResult<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> SkygearResult<()>;
    async fn remove_item(&self, key: &str) -> SkygearResult<()>;
    async fn keys(&self) -> SkygearResult<Vec<String>>;

    /// Removes every cached item except the session and device keys.
    async fn clear_purgeable_items(&self) -> SkygearResult<()> {
        for key in self.keys().await? {
            if !NON_PURGEABLE_KEYS.contains(&key.as_str()) {
                self.remove_item(&key).await?;
            }
        }
        Ok(())
    }

    async fn set_access_token(&self, token: Option<&str>) -> SkygearResult<()> {
        match token {
            Some(token) => self.set_item(ACCESS_TOKEN_KEY, token).await,
            None => self.remove_item(ACCESS_TOKEN_KEY).await,
        }
    }

    async fn access_token(&self) -> SkygearResult<Option<String>> {
        self.get_item(ACCESS_TOKEN_KEY).await
    }

    async fn set_current_user(&self, user: Option<&CurrentUser>) -> SkygearResult<()> {
        match user {
            Some(user) => {
                let serialized = serde_json::to_string(user)
                    .map_err(|err| store_error(format!("Failed to serialize user: {err}")))?;
                self.set_item(CURRENT_USER_KEY, &serialized).await
            }
            None => self.remove_item(CURRENT_USER_KEY).await,
        }
    }

    async fn current_user(&self) -> SkygearResult<Option<CurrentUser>> {
        match self.get_item(CURRENT_USER_KEY).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|err| store_error(format!("Stored user is corrupted: {err}"))),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    items: Mutex<BTreeMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Store for InMemoryStore {
    async fn get_item(&self, key: &str) -> SkygearResult<Option<String>> {
        Ok(self.items.lock().unwrap().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> SkygearResult<()> {
        self.items
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> SkygearResult<()> {
        self.items.lock().unwrap().remove(key);
        Ok(())
    }

    async fn keys(&self) -> SkygearResult<Vec<String>> {
        Ok(self.items.lock().unwrap().keys().cloned().collect())
    }
}

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
mod file;

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
pub use file::FileStore;

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
mod web;

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub use web::WebStorageStore;

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(flavor = "current_thread")]
    async fn clear_purgeable_items_keeps_session_keys() {
        let store = InMemoryStore::new();
        store.set_access_token(Some("tok")).await.unwrap();
        store.set_item(DEVICE_ID_KEY, "device").await.unwrap();
        store.set_item("skygear-cache:records", "[]").await.unwrap();

        store.clear_purgeable_items().await.unwrap();

        assert_eq!(store.access_token().await.unwrap().as_deref(), Some("tok"));
        assert!(store.get_item(DEVICE_ID_KEY).await.unwrap().is_some());
        assert!(store.get_item("skygear-cache:records").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn current_user_is_stored_as_json() {
        let store = InMemoryStore::new();
        let user = CurrentUser::new("u1").with_profile(json!({"_id": "user/u1"}));
        store.set_current_user(Some(&user)).await.unwrap();
        assert_eq!(store.current_user().await.unwrap(), Some(user));

        store.set_current_user(None).await.unwrap();
        assert_eq!(store.current_user().await.unwrap(), None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn corrupted_user_is_reported() {
        let store = InMemoryStore::new();
        store.set_item(CURRENT_USER_KEY, "{oops").await.unwrap();
        assert!(store.current_user().await.is_err());
    }
}
