//! OAuth single sign-on through a popup window or a full-page redirect.
//!
//! [`SsoContainer`] composes a [`crate::container::Container`] with a
//! [`BrowserHost`] and a [`TransientStateStore`]. In the browser these are
//! [`WebBrowserHost`] and [`CookieTransientState`] (feature `wasm-web`); the
//! in-memory implementations work on every target.
//!
//! ```ignore
//! use std::sync::Arc;
//! use skygear_rs_sdk::sso::{CookieTransientState, LoginOptions, SsoContainer, WebBrowserHost};
//!
//! # async fn demo(container: skygear_rs_sdk::container::Container) -> skygear_rs_sdk::error::SkygearResult<()> {
//! let sso = SsoContainer::new(
//!     container,
//!     Arc::new(WebBrowserHost::new()),
//!     Arc::new(CookieTransientState::new()),
//! );
//! let user = sso.login_with_popup("google", LoginOptions::new()).await?;
//! # let _ = user;
//! # Ok(())
//! # }
//! ```

mod api;
pub mod browser;
pub mod cookie;
mod memory;
mod popup;
pub mod transient;
pub mod validator;

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
mod web;

#[doc(inline)]
pub use api::{LoginOptions, MissingResultPolicy, SsoContainer};

#[doc(inline)]
pub use browser::{BrowserHost, ListenerSubscription, MessageListener, OpenerWindow, PopupWindow};

#[doc(inline)]
pub use memory::{InMemoryBrowserHost, InMemoryPopup};

#[doc(inline)]
pub use popup::{PopupHandle, PopupOptions, DEFAULT_POLL_INTERVAL, DEFAULT_WINDOW_FEATURES};

#[doc(inline)]
pub use transient::{InMemoryTransientState, TransientStateStore, SSO_CALLBACK_URL_KEY, SSO_RESULT_KEY};

#[doc(inline)]
pub use validator::is_allowed;

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
#[doc(inline)]
pub use web::{CookieTransientState, WebBrowserHost};
