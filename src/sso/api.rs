use std::future::Future;
use std::sync::{Arc, LazyLock};

use serde_json::{Map, Value};

use crate::auth::CurrentUser;
use crate::container::Container;
use crate::error::{invalid_response, SkygearError, SkygearResult};
use crate::logger::Logger;
use crate::sso::browser::{BrowserHost, OpenerWindow};
use crate::sso::popup::{PopupHandle, PopupOptions};
use crate::sso::transient::{TransientStateStore, SSO_CALLBACK_URL_KEY, SSO_RESULT_KEY};
use crate::sso::validator::is_allowed;
use crate::util::{assign, base64_decode_json};

pub(crate) static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@skygear/sso"));

const UX_MODE_POPUP: &str = "js_popup";
const UX_MODE_REDIRECT: &str = "js_redirect";

/// What the popup callback page does when no login result was stashed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingResultPolicy {
    /// Fail with [`SkygearError::MissingLoginResult`] and leave the popup open.
    #[default]
    Reject,
    /// Log a warning, post nothing and close the popup.
    Tolerate,
}

/// Extra parameters for the provider's authorization URL.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoginOptions {
    params: Map<String, Value>,
}

impl LoginOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback_url(self, url: impl Into<String>) -> Self {
        self.param("callback_url", Value::String(url.into()))
    }

    pub fn scope<I, S>(self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scope = scope
            .into_iter()
            .map(|entry| Value::String(entry.into()))
            .collect();
        self.param("scope", Value::Array(scope))
    }

    pub fn param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Request arguments: `ux_mode` first, then the options, which may override it.
    fn into_args(self, ux_mode: &str) -> Value {
        let mut args = Map::new();
        args.insert("ux_mode".to_string(), Value::String(ux_mode.to_string()));
        assign(&mut args, &self.params);
        Value::Object(args)
    }
}

/// OAuth single sign-on on top of a [`Container`].
#[derive(Clone)]
pub struct SsoContainer {
    container: Container,
    host: Arc<dyn BrowserHost>,
    transient: Arc<dyn TransientStateStore>,
    popup_options: PopupOptions,
    missing_result_policy: MissingResultPolicy,
}

impl std::fmt::Debug for SsoContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsoContainer")
            .field("container", &self.container)
            .field("popup_options", &self.popup_options)
            .field("missing_result_policy", &self.missing_result_policy)
            .finish_non_exhaustive()
    }
}

impl SsoContainer {
    pub fn new(
        container: Container,
        host: Arc<dyn BrowserHost>,
        transient: Arc<dyn TransientStateStore>,
    ) -> Self {
        Self {
            container,
            host,
            transient,
            popup_options: PopupOptions::default(),
            missing_result_policy: MissingResultPolicy::default(),
        }
    }

    pub fn with_popup_options(mut self, options: PopupOptions) -> Self {
        self.popup_options = options;
        self
    }

    pub fn with_missing_result_policy(mut self, policy: MissingResultPolicy) -> Self {
        self.missing_result_policy = policy;
        self
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Logs in through a provider page shown in a popup window.
    ///
    /// The popup is opened before this returns, so it must be called directly
    /// from the user gesture handler. The returned future then fetches the
    /// authorization URL, points the popup at it and waits for either the login
    /// result message or the popup being closed
    /// ([`SkygearError::UserCancelled`]).
    pub fn login_with_popup(
        &self,
        provider: &str,
        options: LoginOptions,
    ) -> impl Future<Output = SkygearResult<CurrentUser>> + 'static {
        let popup = PopupHandle::open(self.host.as_ref(), &self.popup_options);
        let this = self.clone();
        let provider = provider.to_string();

        async move {
            let popup = popup?;
            let auth_url = match this.auth_url(&provider, UX_MODE_POPUP, options).await {
                Ok(auth_url) => auth_url,
                Err(err) => {
                    popup.close();
                    return Err(err);
                }
            };
            let listener = match this.host.listen_for_messages() {
                Ok(listener) => listener,
                Err(err) => {
                    popup.close();
                    return Err(err);
                }
            };
            if let Err(err) = popup.navigate(&auth_url) {
                popup.close();
                return Err(err);
            }

            let result = popup
                .wait_for_result(listener, this.popup_options.poll_interval)
                .await?;
            this.container.auth().auth_resolve(&result).await
        }
    }

    /// Sends the current window to the provider's login page.
    ///
    /// Resolves once navigation is issued; the flow continues on the callback page.
    pub async fn login_with_redirect(
        &self,
        provider: &str,
        options: LoginOptions,
    ) -> SkygearResult<()> {
        let auth_url = self.auth_url(provider, UX_MODE_REDIRECT, options).await?;
        self.host.navigate(&auth_url)
    }

    /// Runs on the page the provider returns to.
    ///
    /// Inside a popup the stashed login result is posted to the opener for every
    /// authorized origin and the popup closes itself. Otherwise the stashed
    /// callback URL is opened if it is on the authorized list.
    pub async fn handle_callback(&self) -> SkygearResult<()> {
        let callback_url = self.transient.take(SSO_CALLBACK_URL_KEY);
        let encoded_result = self.transient.take(SSO_RESULT_KEY);
        let callback_url = callback_url?;
        let encoded_result = encoded_result?;

        let config = self.container.lambda("sso/config", None).await?;
        let authorized_urls: Vec<String> = config
            .get("authorized_urls")
            .and_then(Value::as_array)
            .map(|urls| {
                urls.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        match self.host.opener() {
            Some(opener) => {
                self.post_result_to_opener(opener.as_ref(), encoded_result, &authorized_urls)
            }
            None => {
                if is_allowed(callback_url.as_deref(), &authorized_urls) {
                    let url = callback_url.unwrap_or_default();
                    self.host.navigate(&url)
                } else {
                    Err(SkygearError::UnauthorizedCallbackDomain(
                        callback_url.unwrap_or_default(),
                    ))
                }
            }
        }
    }

    async fn auth_url(
        &self,
        provider: &str,
        ux_mode: &str,
        options: LoginOptions,
    ) -> SkygearResult<String> {
        let action = format!("sso/{provider}/login_auth_url");
        let result = self
            .container
            .lambda(&action, Some(options.into_args(ux_mode)))
            .await?;
        result
            .get("auth_url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| invalid_response(format!("`{action}` returned no auth_url")))
    }

    fn post_result_to_opener(
        &self,
        opener: &dyn OpenerWindow,
        encoded_result: Option<String>,
        authorized_urls: &[String],
    ) -> SkygearResult<()> {
        let result = match encoded_result.as_deref().map(base64_decode_json) {
            Some(Ok(result)) if !result.is_null() => Some(result),
            Some(Err(err)) => {
                LOGGER.warn(format!("Stashed login result is unreadable: {err}"));
                None
            }
            _ => None,
        };

        match (result, self.missing_result_policy) {
            (Some(result), _) => {
                for origin in authorized_urls {
                    if let Err(err) = opener.post_message(&result, origin) {
                        LOGGER.warn(format!("Failed to post login result to {origin}: {err}"));
                    }
                }
            }
            (None, MissingResultPolicy::Reject) => return Err(SkygearError::MissingLoginResult),
            (None, MissingResultPolicy::Tolerate) => {
                LOGGER.warn("Fail to retrieve login result; closing popup without posting");
            }
        }
        self.host.close_window();
        Ok(())
    }
}
