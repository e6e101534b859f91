//! Client SDK for the Skygear backend-as-a-service platform.
//!
//! - [`container`]: signed action requests, response classification and the
//!   implicit logout when the server rejects the access token.
//! - [`auth`]: session state, its persistence and auth helpers.
//! - [`sso`]: OAuth login through a popup or a redirect, plus the callback
//!   page handler.
//!
//! Enable the `wasm-web` feature on `wasm32` targets for the browser-backed
//! store, window host and cookie channel.

pub mod auth;
pub mod container;
pub mod error;
pub mod logger;
pub mod platform;
pub mod push;
pub mod sso;
pub mod util;

#[doc(inline)]
pub use container::{Container, ContainerBuilder, ContainerOptions};

#[doc(inline)]
pub use error::{SkygearError, SkygearResult};

#[cfg(all(test, not(target_arch = "wasm32")))]
mod test_support;
