use std::sync::{Arc, Mutex};

use crate::auth::model::CurrentUser;
use crate::auth::store::Store;
use crate::error::SkygearResult;
use crate::logger::Logger;

/// Current user and access token. Either both are present or neither is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    inner: Option<(CurrentUser, String)>,
}

impl Session {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn authenticated(user: CurrentUser, access_token: impl Into<String>) -> Self {
        Self {
            inner: Some((user, access_token.into())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.inner.as_ref().map(|(user, _)| user)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user().map(|user| user.id.as_str())
    }

    pub fn access_token(&self) -> Option<&str> {
        self.inner.as_ref().map(|(_, token)| token.as_str())
    }
}

/// Session owned by a container and mirrored into its store.
///
/// The in-memory value is swapped inside one critical section, so readers see
/// either the old or the new session. A new session is only swapped in once it
/// is persisted; clearing swaps first and then empties the store.
pub struct SessionState {
    session: Mutex<Session>,
    store: Arc<dyn Store>,
    logger: Logger,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("session", &*self.session.lock().unwrap())
            .finish_non_exhaustive()
    }
}

impl SessionState {
    pub fn new(store: Arc<dyn Store>, logger: Logger) -> Self {
        Self {
            session: Mutex::new(Session::empty()),
            store,
            logger,
        }
    }

    pub fn snapshot(&self) -> Session {
        self.session.lock().unwrap().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.session
            .lock()
            .unwrap()
            .access_token()
            .map(str::to_string)
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.session.lock().unwrap().user().cloned()
    }

    pub fn store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    /// Persists the user and token, then makes them the current session.
    ///
    /// On a store failure the in-memory session is left untouched and the
    /// persisted copy is put back to it.
    pub async fn set(&self, user: CurrentUser, access_token: String) -> SkygearResult<()> {
        let (token_result, user_result) = futures::join!(
            self.store.set_access_token(Some(&access_token)),
            self.store.set_current_user(Some(&user)),
        );
        if let Err(err) = token_result.and(user_result) {
            self.logger
                .warn(format!("failed to persist session of user {}: {err}", user.id));
            self.persist_snapshot().await;
            return Err(err);
        }
        *self.session.lock().unwrap() = Session::authenticated(user, access_token);
        Ok(())
    }

    async fn persist_snapshot(&self) {
        let current = self.snapshot();
        let (token_result, user_result) = futures::join!(
            self.store.set_access_token(current.access_token()),
            self.store.set_current_user(current.user()),
        );
        if let Err(err) = token_result.and(user_result) {
            self.logger
                .warn(format!("failed to restore persisted session: {err}"));
        }
    }

    /// Empties the session. Clearing an already empty session is not an error
    /// and still resets the persisted copy.
    pub async fn clear(&self) -> SkygearResult<()> {
        let previous = std::mem::take(&mut *self.session.lock().unwrap());
        if let Some(user_id) = previous.user_id() {
            self.logger.debug(format!("clearing session of user {user_id}"));
        }
        let (token_result, user_result) = futures::join!(
            self.store.set_access_token(None),
            self.store.set_current_user(None),
        );
        token_result.and(user_result)
    }

    /// Loads the persisted session. A half-persisted session (token without
    /// user or the other way round) is treated as signed out.
    pub async fn restore(&self) -> SkygearResult<()> {
        let (token, user) = futures::join!(self.store.access_token(), self.store.current_user());
        let restored = match (token?, user?) {
            (Some(token), Some(user)) => Session::authenticated(user, token),
            (None, None) => Session::empty(),
            _ => {
                self.logger
                    .warn("persisted session is incomplete; starting signed out");
                Session::empty()
            }
        };
        *self.session.lock().unwrap() = restored;
        Ok(())
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::auth::store::{InMemoryStore, CURRENT_USER_KEY};
    use crate::error::{store_error, SkygearError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-memory store whose user writes fail while `fail_user_writes` is set.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryStore,
        fail_user_writes: AtomicBool,
    }

    #[async_trait]
    impl Store for FlakyStore {
        async fn get_item(&self, key: &str) -> SkygearResult<Option<String>> {
            self.inner.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: &str) -> SkygearResult<()> {
            if key == CURRENT_USER_KEY && self.fail_user_writes.load(Ordering::SeqCst) {
                return Err(store_error("disk full"));
            }
            self.inner.set_item(key, value).await
        }

        async fn remove_item(&self, key: &str) -> SkygearResult<()> {
            self.inner.remove_item(key).await
        }

        async fn keys(&self) -> SkygearResult<Vec<String>> {
            self.inner.keys().await
        }
    }

    fn session_state() -> (SessionState, Arc<dyn Store>) {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        (
            SessionState::new(store.clone(), Logger::new("@skygear/session-test")),
            store,
        )
    }

    #[tokio::test(flavor = "current_thread")]
    async fn set_populates_both_fields_and_store() {
        let (state, store) = session_state();
        state.set(CurrentUser::new("u1"), "tok".into()).await.unwrap();

        let session = state.snapshot();
        assert_eq!(session.user_id(), Some("u1"));
        assert_eq!(session.access_token(), Some("tok"));
        assert_eq!(store.access_token().await.unwrap().as_deref(), Some("tok"));
        assert_eq!(store.current_user().await.unwrap().unwrap().id, "u1");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn clear_is_idempotent() {
        let (state, store) = session_state();
        state.set(CurrentUser::new("u1"), "tok".into()).await.unwrap();

        let (first, second) = futures::join!(state.clear(), state.clear());
        first.unwrap();
        second.unwrap();
        state.clear().await.unwrap();

        assert!(state.snapshot().is_empty());
        assert!(store.access_token().await.unwrap().is_none());
        assert!(store.current_user().await.unwrap().is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn restore_ignores_partial_sessions() {
        let (state, store) = session_state();
        store.set_access_token(Some("orphan")).await.unwrap();
        state.restore().await.unwrap();
        assert!(state.snapshot().is_empty());

        store
            .set_current_user(Some(&CurrentUser::new("u1")))
            .await
            .unwrap();
        state.restore().await.unwrap();
        assert_eq!(state.snapshot().user_id(), Some("u1"));
        assert_eq!(state.access_token().as_deref(), Some("orphan"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_set_keeps_signed_out_session() {
        let store = Arc::new(FlakyStore::default());
        store.fail_user_writes.store(true, Ordering::SeqCst);
        let state = SessionState::new(store.clone(), Logger::new("@skygear/session-test"));

        let err = state
            .set(CurrentUser::new("u1"), "tok".into())
            .await
            .unwrap_err();

        assert_eq!(err, SkygearError::Store("disk full".into()));
        assert!(state.snapshot().is_empty());
        assert!(state.access_token().is_none());
        assert!(store.access_token().await.unwrap().is_none());
        assert!(store.current_user().await.unwrap().is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_set_keeps_previous_session() {
        let store = Arc::new(FlakyStore::default());
        let state = SessionState::new(store.clone(), Logger::new("@skygear/session-test"));
        state.set(CurrentUser::new("u0"), "old".into()).await.unwrap();

        store.fail_user_writes.store(true, Ordering::SeqCst);
        state
            .set(CurrentUser::new("u1"), "new".into())
            .await
            .unwrap_err();

        assert_eq!(state.snapshot().user_id(), Some("u0"));
        assert_eq!(state.access_token().as_deref(), Some("old"));
        assert_eq!(store.access_token().await.unwrap().as_deref(), Some("old"));
        assert_eq!(store.current_user().await.unwrap().unwrap().id, "u0");
    }
}
