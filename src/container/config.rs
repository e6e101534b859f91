use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_END_POINT: &str = "http://localhost:3000/";
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 60_000;

const API_KEY_ENV: &str = "SKYGEAR_API_KEY";
const END_POINT_ENV: &str = "SKYGEAR_END_POINT";

/// How long a request may take before the transport gives up.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeoutOptions {
    /// Maximum time to wait for the server to start responding.
    #[serde(with = "optional_millis")]
    pub response: Option<Duration>,
    /// Deadline for the whole request/response exchange.
    #[serde(with = "optional_millis")]
    pub deadline: Option<Duration>,
}

impl Default for TimeoutOptions {
    fn default() -> Self {
        Self {
            response: Some(Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS)),
            deadline: None,
        }
    }
}

impl TimeoutOptions {
    pub fn none() -> Self {
        Self {
            response: None,
            deadline: None,
        }
    }

    /// The single timeout handed to the transport: the tighter of the two limits.
    pub fn effective(&self) -> Option<Duration> {
        match (self.response, self.deadline) {
            (Some(response), Some(deadline)) => Some(response.min(deadline)),
            (response, deadline) => response.or(deadline),
        }
    }
}

/// Connection settings of a container.
///
/// Fields left as `None` keep the container's current value when passed to
/// [`crate::container::Container::config`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerOptions {
    pub api_key: Option<String>,
    pub end_point: Option<String>,
    pub timeout: Option<TimeoutOptions>,
}

impl ContainerOptions {
    pub fn new(api_key: impl Into<String>, end_point: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            end_point: Some(end_point.into()),
            timeout: None,
        }
    }

    /// Reads `SKYGEAR_API_KEY` and `SKYGEAR_END_POINT`.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).ok().filter(|v| !v.is_empty()),
            end_point: std::env::var(END_POINT_ENV).ok().filter(|v| !v.is_empty()),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: TimeoutOptions) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Appends the trailing `/` request paths are joined onto.
///
/// Returns `None` for an empty end point so callers keep their previous value.
pub fn normalize_end_point(end_point: &str) -> Option<String> {
    let trimmed = end_point.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.ends_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("{trimmed}/"))
    }
}

mod optional_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
