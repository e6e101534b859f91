use std::sync::{Arc, LazyLock, Mutex};

use serde_json::{Map, Value};

use crate::auth::session::SessionState;
use crate::auth::AuthContainer;
use crate::container::config::{
    normalize_end_point, ContainerOptions, TimeoutOptions, DEFAULT_END_POINT,
};
use crate::container::request::RequestSigner;
use crate::container::response::classify;
use crate::container::transport::{HttpTransport, ReqwestTransport};
use crate::error::SkygearResult;
use crate::logger::Logger;
use crate::platform::Platform;

pub(crate) static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@skygear/container"));

/// Client entry point: signs action requests, sends them and owns the session.
///
/// Cloning is cheap and every clone shares configuration and session.
#[derive(Clone, Debug)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    config: Mutex<ConnectionConfig>,
    transport: Arc<dyn HttpTransport>,
    platform: Platform,
    session: Arc<SessionState>,
    device_id: Mutex<Option<String>>,
}

impl std::fmt::Debug for ContainerInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerInner")
            .field("config", &*self.config.lock().unwrap())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
struct ConnectionConfig {
    api_key: Option<String>,
    end_point: String,
    timeout: TimeoutOptions,
}

impl ConnectionConfig {
    fn apply(&mut self, options: &ContainerOptions) {
        if let Some(api_key) = &options.api_key {
            self.api_key = Some(api_key.clone());
        }
        if let Some(end_point) = options.end_point.as_deref().and_then(normalize_end_point) {
            self.end_point = end_point;
        }
        if let Some(timeout) = &options.timeout {
            self.timeout = timeout.clone();
        }
    }
}

#[derive(Default)]
pub struct ContainerBuilder {
    options: ContainerOptions,
    transport: Option<Arc<dyn HttpTransport>>,
    platform: Option<Platform>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Store and push strategy, fixed for the lifetime of the container.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn build(self) -> Container {
        let mut config = ConnectionConfig {
            api_key: None,
            end_point: DEFAULT_END_POINT.to_string(),
            timeout: TimeoutOptions::default(),
        };
        config.apply(&self.options);

        let platform = self.platform.unwrap_or_default();
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new()));
        let session = Arc::new(SessionState::new(
            platform.store(),
            Logger::new("@skygear/session"),
        ));

        Container {
            inner: Arc::new(ContainerInner {
                config: Mutex::new(config),
                transport,
                platform,
                session,
                device_id: Mutex::new(None),
            }),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        ContainerBuilder::new().build()
    }
}

impl Container {
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Applies the fields set in `options`, then restores the persisted
    /// session and push device id.
    ///
    /// Restore failures are logged; the container stays usable signed out.
    pub async fn config(&self, options: ContainerOptions) -> SkygearResult<Container> {
        self.inner.config.lock().unwrap().apply(&options);

        if let Err(err) = self.inner.session.restore().await {
            LOGGER.warn(format!("Failed to restore session: {err}"));
        }
        match self.inner.platform.push().restore_device_id().await {
            Ok(device_id) => *self.inner.device_id.lock().unwrap() = device_id,
            Err(err) => LOGGER.warn(format!("Failed to restore device id: {err}")),
        }
        Ok(self.clone())
    }

    pub fn config_api_key(&self, api_key: impl Into<String>) {
        self.inner.config.lock().unwrap().api_key = Some(api_key.into());
    }

    pub fn config_end_point(&self, end_point: &str) {
        if let Some(end_point) = normalize_end_point(end_point) {
            self.inner.config.lock().unwrap().end_point = end_point;
        }
    }

    pub fn set_timeout_options(&self, timeout: TimeoutOptions) {
        self.inner.config.lock().unwrap().timeout = timeout;
    }

    pub fn api_key(&self) -> Option<String> {
        self.inner.config.lock().unwrap().api_key.clone()
    }

    pub fn end_point(&self) -> String {
        self.inner.config.lock().unwrap().end_point.clone()
    }

    pub fn timeout_options(&self) -> TimeoutOptions {
        self.inner.config.lock().unwrap().timeout.clone()
    }

    pub fn device_id(&self) -> Option<String> {
        self.inner.device_id.lock().unwrap().clone()
    }

    pub fn platform(&self) -> &Platform {
        &self.inner.platform
    }

    pub fn session(&self) -> Arc<SessionState> {
        self.inner.session.clone()
    }

    pub fn auth(&self) -> AuthContainer {
        AuthContainer::new(self.clone())
    }

    fn signer(&self) -> RequestSigner {
        let config = self.inner.config.lock().unwrap().clone();
        RequestSigner {
            end_point: config.end_point,
            api_key: config.api_key,
            access_token: self.inner.session.access_token(),
            timeout: config.timeout.effective(),
        }
    }

    /// Sends `action` with `data` and returns the decoded response body.
    ///
    /// When the server rejects the access token the session is cleared before
    /// the error is returned.
    pub async fn make_request(
        &self,
        action: &str,
        data: Map<String, Value>,
    ) -> SkygearResult<Value> {
        let request = self.signer().sign(action, &data)?;
        let outcome = self.inner.transport.send(request).await;
        match classify(outcome) {
            Ok(body) => Ok(body),
            Err(err) => {
                if err.is_access_token_not_accepted() {
                    LOGGER.info(format!(
                        "Access token rejected while calling `{action}`; clearing session"
                    ));
                    if let Err(clear_err) = self.inner.session.clear().await {
                        LOGGER.warn(format!("Failed to clear session: {clear_err}"));
                    }
                }
                Err(err)
            }
        }
    }

    /// Calls a cloud function and returns its `result` (`null` when absent).
    pub async fn lambda(&self, name: &str, args: Option<Value>) -> SkygearResult<Value> {
        let mut data = Map::new();
        if let Some(args) = args {
            data.insert("args".to_string(), args);
        }
        let mut body = self.make_request(name, data).await?;
        Ok(body
            .get_mut("result")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// Drops cached data, keeping the session and device id.
    pub async fn clear_cache(&self) -> SkygearResult<()> {
        self.inner.platform.store().clear_purgeable_items().await
    }
}
