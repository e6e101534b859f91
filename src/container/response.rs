use serde_json::{Map, Value};

use crate::container::transport::{RawResponse, TransportOutcome};
use crate::error::{ErrorCode, ServerError, SkygearError, SkygearResult};
use crate::util::json::parse_or_empty;

use super::api::LOGGER;

/// JSON body of a response.
///
/// Prefers the body decoded by the transport, then parses the raw text. A body
/// that cannot be recovered decodes to `{}`.
pub fn decode_body(response: Option<&RawResponse>) -> Value {
    let Some(response) = response else {
        return Value::Object(Map::new());
    };
    if let Some(body) = &response.body {
        return body.clone();
    }
    match response.text.as_deref() {
        Some(text) => match parse_or_empty(text) {
            Ok(value) => value,
            Err((fallback, err)) => {
                LOGGER.warn(format!(
                    "Failed to parse response body (status {}): {err}",
                    response.status
                ));
                fallback
            }
        },
        None => Value::Object(Map::new()),
    }
}

/// Turns a transport outcome into the decoded body or a classified error.
///
/// A failed exchange whose body carries an `error` object or message becomes
/// [`SkygearError::Server`]; every other failure is a
/// [`SkygearError::Network`].
pub fn classify(outcome: TransportOutcome) -> SkygearResult<Value> {
    let body = decode_body(outcome.response.as_ref());
    match outcome.error {
        None => Ok(body),
        Some(error) => {
            let status = error
                .status
                .or_else(|| outcome.response.as_ref().map(|response| response.status));
            match body.get("error") {
                Some(Value::String(message)) => Err(SkygearError::Server(ServerError {
                    status,
                    code: ErrorCode::UnexpectedError,
                    name: None,
                    message: message.clone(),
                    info: None,
                })),
                Some(value) => match ServerError::from_json(status, value) {
                    Some(server_error) => Err(SkygearError::Server(server_error)),
                    None => Err(SkygearError::Network {
                        status,
                        message: error.message,
                    }),
                },
                None => Err(SkygearError::Network {
                    status,
                    message: error.message,
                }),
            }
        }
    }
}
