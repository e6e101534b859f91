use std::sync::LazyLock;

use serde_json::{Map, Value};

use crate::auth::model::{AuthResponse, CurrentUser};
use crate::container::Container;
use crate::error::SkygearResult;
use crate::logger::Logger;

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@skygear/auth"));

/// Auth operations layered on a [`Container`].
#[derive(Clone, Debug)]
pub struct AuthContainer {
    container: Container,
}

impl AuthContainer {
    pub fn new(container: Container) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.container.session().current_user()
    }

    pub fn access_token(&self) -> Option<String> {
        self.container.session().access_token()
    }

    /// Stores the user and access token carried by a login result and returns
    /// the user.
    pub async fn auth_resolve(&self, payload: &Value) -> SkygearResult<CurrentUser> {
        let AuthResponse { user, access_token } = AuthResponse::from_json(payload)?;
        self.container
            .session()
            .set(user.clone(), access_token)
            .await?;
        LOGGER.debug(format!("signed in as {}", user.id));
        Ok(user)
    }

    /// Signs out on the server, then drops the local session and cached data.
    ///
    /// The local state is cleared even when the server call fails; only a
    /// store failure is returned.
    pub async fn logout(&self) -> SkygearResult<()> {
        if let Err(err) = self.container.make_request("auth:logout", Map::new()).await {
            LOGGER.warn(format!("Server logout failed: {err}"));
        }
        self.container.session().clear().await?;
        self.container.clear_cache().await
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::error::SkygearError;
    use crate::test_support::{test_container, try_start_mock_server};
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test(flavor = "current_thread")]
    async fn auth_resolve_sets_session() {
        let auth = Container::default().auth();
        let user = auth
            .auth_resolve(&json!({
                "result": {"user_id": "u1", "access_token": "tok", "profile": {"_id": "user/u1"}}
            }))
            .await
            .unwrap();

        assert_eq!(user.id, "u1");
        assert_eq!(auth.current_user().unwrap().id, "u1");
        assert_eq!(auth.access_token().as_deref(), Some("tok"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn auth_resolve_rejects_incomplete_payload() {
        let auth = Container::default().auth();
        let err = auth
            .auth_resolve(&json!({"result": {"user_id": "u1"}}))
            .await
            .unwrap_err();
        assert!(matches!(err, SkygearError::InvalidResponse(_)));
        assert!(auth.current_user().is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn logout_clears_session_even_when_server_fails() {
        let Some(server) = try_start_mock_server() else {
            eprintln!("Skipping logout_clears_session_even_when_server_fails: unable to start mock server");
            return;
        };
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/logout")
                .header("x-skygear-access-token", "tok");
            then.status(500)
                .header("content-type", "application/json")
                .json_body(json!({"error": {"code": 10000, "message": "boom"}}));
        });

        let container = test_container(&server);
        let auth = container.auth();
        auth.auth_resolve(&json!({"user_id": "u1", "access_token": "tok"}))
            .await
            .unwrap();

        auth.logout().await.unwrap();

        mock.assert();
        assert!(auth.current_user().is_none());
        assert!(auth.access_token().is_none());
    }
}
