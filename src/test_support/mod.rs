//! Test utilities shared across crate-level unit tests.

pub mod container;
pub mod http;

pub use container::test_container;
pub use http::try_start_mock_server;
