use httpmock::MockServer;

use crate::container::{Container, ContainerOptions};

/// Container with API key `key` pointed at `server`, backed by an in-memory platform.
pub fn test_container(server: &MockServer) -> Container {
    Container::builder()
        .with_options(ContainerOptions::new("key", server.base_url()))
        .build()
}
