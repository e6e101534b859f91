//! Push-notification device registration boundary.
//!
//! Device registration itself lives outside the SDK core; the container only
//! needs to restore the device id recorded by a previous registration when it
//! is configured.

use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::store::{Store, DEVICE_ID_KEY};
use crate::error::SkygearResult;

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PushRegistrar: Send + Sync {
    /// Returns the device id of an earlier registration, if any.
    async fn restore_device_id(&self) -> SkygearResult<Option<String>>;

    async fn save_device_id(&self, device_id: Option<&str>) -> SkygearResult<()>;
}

/// Keeps the device id in the platform store under a non-purgeable key.
pub struct StorePushRegistrar {
    store: Arc<dyn Store>,
}

impl StorePushRegistrar {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PushRegistrar for StorePushRegistrar {
    async fn restore_device_id(&self) -> SkygearResult<Option<String>> {
        self.store.get_item(DEVICE_ID_KEY).await
    }

    async fn save_device_id(&self, device_id: Option<&str>) -> SkygearResult<()> {
        match device_id {
            Some(id) => self.store.set_item(DEVICE_ID_KEY, id).await,
            None => self.store.remove_item(DEVICE_ID_KEY).await,
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::auth::store::InMemoryStore;

    #[tokio::test(flavor = "current_thread")]
    async fn device_id_survives_cache_purge() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let push = StorePushRegistrar::new(store.clone());
        push.save_device_id(Some("device-1")).await.unwrap();

        store.clear_purgeable_items().await.unwrap();

        assert_eq!(
            push.restore_device_id().await.unwrap().as_deref(),
            Some("device-1")
        );
    }
}
