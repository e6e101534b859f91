//! Session state, its persistence, and auth operations on a container.
//!
//! A [`Session`] holds the current user and access token as one unit. The
//! [`SessionState`] owned by each container mirrors it into a [`Store`].

mod api;
pub mod model;
pub mod session;
pub mod store;

#[doc(inline)]
pub use api::AuthContainer;

#[doc(inline)]
pub use model::{AuthResponse, CurrentUser};

#[doc(inline)]
pub use session::{Session, SessionState};

#[doc(inline)]
pub use store::{InMemoryStore, Store};

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
#[doc(inline)]
pub use store::FileStore;

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
#[doc(inline)]
pub use store::WebStorageStore;
