//! Request container: signs action requests, sends them through an
//! [`HttpTransport`] and classifies the outcome.
//!
//! ```ignore
//! use skygear_rs_sdk::container::{Container, ContainerOptions};
//!
//! # async fn demo() -> skygear_rs_sdk::error::SkygearResult<()> {
//! let container = Container::default()
//!     .config(ContainerOptions::new("my-api-key", "https://myapp.skygeario.com"))
//!     .await?;
//! let greeting = container.lambda("hello:world", Some(serde_json::json!(["Ann"]))).await?;
//! # let _ = greeting;
//! # Ok(())
//! # }
//! ```

mod api;
pub mod config;
pub mod request;
pub mod response;
pub mod transport;

#[doc(inline)]
pub use api::{Container, ContainerBuilder};

#[doc(inline)]
pub use config::{ContainerOptions, TimeoutOptions};

#[doc(inline)]
pub use request::{action_path, RequestSigner, SignedRequest};

#[doc(inline)]
pub use transport::{HttpTransport, RawResponse, ReqwestTransport, TransportError, TransportOutcome};
