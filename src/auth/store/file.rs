use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::auth::store::Store;
use crate::error::{store_error, SkygearResult};

/// Stores items as a single JSON object on disk.
///
/// Every mutation rewrites the whole file; the in-process lock serialises
/// read-modify-write cycles from concurrent callers.
#[derive(Clone)]
pub struct FileStore {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore").field("path", &self.path).finish()
    }
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: Arc::new(path.as_ref().to_path_buf()),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_items(&self) -> SkygearResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&*self.path)
            .map_err(|err| store_error(format!("Failed to read store file: {err}")))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .map_err(|err| store_error(format!("Store file is corrupted: {err}")))
    }

    fn write_items(&self, items: &BTreeMap<String, String>) -> SkygearResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| store_error(format!("Failed to create store directory: {err}")))?;
        }
        let serialized = serde_json::to_string(items)
            .map_err(|err| store_error(format!("Failed to serialize store: {err}")))?;
        fs::write(&*self.path, serialized)
            .map_err(|err| store_error(format!("Failed to write store file: {err}")))
    }

    fn update<F>(&self, mutate: F) -> SkygearResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.lock.lock().unwrap();
        let mut items = self.read_items()?;
        if mutate(&mut items) {
            self.write_items(&items)?;
        }
        Ok(())
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Store for FileStore {
    async fn get_item(&self, key: &str) -> SkygearResult<Option<String>> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.read_items()?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> SkygearResult<()> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
            true
        })
    }

    async fn remove_item(&self, key: &str) -> SkygearResult<()> {
        self.update(|items| items.remove(key).is_some())
    }

    async fn keys(&self) -> SkygearResult<Vec<String>> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.read_items()?.into_keys().collect())
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::auth::model::CurrentUser;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store_path(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("skygear-store-{label}-{nanos}.json"))
    }

    #[tokio::test(flavor = "current_thread")]
    async fn items_survive_a_new_instance() {
        let path = temp_store_path("reload");
        let store = FileStore::new(&path);
        store.set_access_token(Some("tok")).await.unwrap();
        store
            .set_current_user(Some(&CurrentUser::new("u1")))
            .await
            .unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.access_token().await.unwrap().as_deref(), Some("tok"));
        assert_eq!(reopened.current_user().await.unwrap().unwrap().id, "u1");

        let _ = fs::remove_file(path);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn removing_missing_items_is_a_noop() {
        let path = temp_store_path("noop");
        let store = FileStore::new(&path);
        store.set_access_token(None).await.unwrap();
        assert!(!path.exists());
        assert!(store.keys().await.unwrap().is_empty());
    }
}
