use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;

use crate::container::request::SignedRequest;

/// Raw HTTP response as seen by the transport.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// Body already decoded by the transport (JSON content type only).
    pub body: Option<Value>,
    pub text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// `{error, response}` pair produced for every request; a non-2xx reply has both.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransportOutcome {
    pub error: Option<TransportError>,
    pub response: Option<RawResponse>,
}

impl TransportOutcome {
    pub fn success(response: RawResponse) -> Self {
        Self {
            error: None,
            response: Some(response),
        }
    }

    pub fn failure(error: TransportError, response: Option<RawResponse>) -> Self {
        Self {
            error: Some(error),
            response,
        }
    }
}

/// Sends signed requests over HTTP. Failures are reported inside the outcome.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: SignedRequest) -> TransportOutcome;
}

#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn build_headers(request: &SignedRequest) -> Result<HeaderMap, TransportError> {
        let mut map = HeaderMap::new();
        for (key, value) in &request.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
                TransportError::new(None, format!("invalid header name `{key}`: {err}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|err| {
                TransportError::new(None, format!("invalid header value for `{key}`: {err}"))
            })?;
            map.insert(name, header_value);
        }
        Ok(map)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: SignedRequest) -> TransportOutcome {
        let headers = match Self::build_headers(&request) {
            Ok(headers) => headers,
            Err(err) => return TransportOutcome::failure(err, None),
        };
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .unwrap_or(reqwest::Method::POST);

        let builder = self
            .client
            .request(method, request.url.as_str())
            .headers(headers)
            .body(request.body.to_string());

        #[cfg(not(target_arch = "wasm32"))]
        let builder = match request.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                let status = err.status().map(|status| status.as_u16());
                return TransportOutcome::failure(map_reqwest_error(status, &err), None);
            }
        };

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("json"))
            .unwrap_or(false);
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                return TransportOutcome::failure(
                    TransportError::new(
                        Some(status.as_u16()),
                        format!("failed to read response body: {err}"),
                    ),
                    None,
                )
            }
        };

        let body = if is_json {
            serde_json::from_str(&text).ok()
        } else {
            None
        };
        let raw = RawResponse {
            status: status.as_u16(),
            body,
            text: Some(text),
        };

        if status.is_success() {
            TransportOutcome::success(raw)
        } else {
            let reason = status.canonical_reason().unwrap_or("Unknown status");
            TransportOutcome::failure(
                TransportError::new(Some(status.as_u16()), reason),
                Some(raw),
            )
        }
    }
}

fn map_reqwest_error(status: Option<u16>, err: &reqwest::Error) -> TransportError {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_timeout() {
            return TransportError::new(status, format!("request timed out: {err}"));
        }
        if err.is_connect() {
            return TransportError::new(status, format!("failed to connect: {err}"));
        }
    }
    TransportError::new(status, format!("request failed: {err}"))
}
