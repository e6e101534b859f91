use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Map, Value};
use url::Url;

use crate::error::{configuration_error, SkygearResult};

pub const SDK_VERSION: &str = concat!("skygear-SDK-RS/", env!("CARGO_PKG_VERSION"));

pub const API_KEY_HEADER: &str = "X-Skygear-API-Key";
pub const ACCESS_TOKEN_HEADER: &str = "X-Skygear-Access-Token";
pub const SDK_VERSION_HEADER: &str = "X-Skygear-SDK-Version";

/// A fully prepared action request, ready for the transport.
#[derive(Clone, Debug, PartialEq)]
pub struct SignedRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
    pub timeout: Option<Duration>,
}

/// Turns an action name and payload into a [`SignedRequest`].
///
/// Built per call from the container's current configuration and session.
#[derive(Clone, Debug)]
pub struct RequestSigner {
    pub end_point: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub timeout: Option<Duration>,
}

impl RequestSigner {
    pub fn sign(&self, action: &str, payload: &Map<String, Value>) -> SkygearResult<SignedRequest> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| configuration_error("Please config ApiKey"))?;

        let base = Url::parse(&self.end_point).map_err(|err| {
            configuration_error(format!("Invalid end point `{}`: {err}", self.end_point))
        })?;
        let url = base.join(&action_path(action)).map_err(|err| {
            configuration_error(format!("Invalid action `{action}`: {err}"))
        })?;

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert(API_KEY_HEADER.to_string(), api_key.to_string());
        headers.insert(SDK_VERSION_HEADER.to_string(), SDK_VERSION.to_string());

        let mut body = Map::new();
        if let Some(token) = &self.access_token {
            headers.insert(ACCESS_TOKEN_HEADER.to_string(), token.clone());
            body.insert("access_token".to_string(), Value::String(token.clone()));
        }
        body.insert("action".to_string(), Value::String(action.to_string()));
        body.insert("api_key".to_string(), Value::String(api_key.to_string()));
        for (key, value) in payload {
            body.insert(key.clone(), value.clone());
        }

        Ok(SignedRequest {
            method: "POST",
            url: url.into(),
            headers,
            body: Value::Object(body),
            timeout: self.timeout,
        })
    }
}

/// Maps an action name to its URL path: every `:` becomes `/`.
pub fn action_path(action: &str) -> String {
    action.trim_start_matches('/').replace(':', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkygearError;
    use serde_json::json;

    fn signer(api_key: Option<&str>, access_token: Option<&str>) -> RequestSigner {
        RequestSigner {
            end_point: "https://app.example.com/".into(),
            api_key: api_key.map(str::to_string),
            access_token: access_token.map(str::to_string),
            timeout: Some(Duration::from_secs(60)),
        }
    }

    #[test]
    fn colons_map_to_slashes() {
        assert_eq!(action_path("sso/google/login_auth_url"), "sso/google/login_auth_url");
        assert_eq!(action_path("user:login"), "user/login");
        assert_eq!(action_path("record:query:all"), "record/query/all");
    }

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let err = signer(None, None).sign("me", &Map::new()).unwrap_err();
        assert_eq!(err, SkygearError::Configuration("Please config ApiKey".into()));
    }

    #[test]
    fn signs_headers_and_body() {
        let payload = json!({"args": {"x": 1}}).as_object().cloned().unwrap();
        let request = signer(Some("key"), Some("tok"))
            .sign("user:login", &payload)
            .unwrap();

        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "https://app.example.com/user/login");
        assert_eq!(request.headers.get(API_KEY_HEADER).map(String::as_str), Some("key"));
        assert_eq!(
            request.headers.get(ACCESS_TOKEN_HEADER).map(String::as_str),
            Some("tok")
        );
        assert_eq!(
            request.body,
            json!({"action": "user:login", "api_key": "key", "access_token": "tok", "args": {"x": 1}})
        );
        assert_eq!(request.timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn anonymous_requests_carry_no_token() {
        let request = signer(Some("key"), None).sign("sso/config", &Map::new()).unwrap();
        assert!(!request.headers.contains_key(ACCESS_TOKEN_HEADER));
        assert!(request.body.get("access_token").is_none());
    }

    #[test]
    fn payload_keys_are_written_last() {
        let payload = json!({"action": "other", "api_key": "k2", "access_token": "t2"})
            .as_object()
            .cloned()
            .unwrap();
        let request = signer(Some("key"), Some("tok")).sign("me", &payload).unwrap();
        assert_eq!(
            request.body,
            json!({"action": "other", "api_key": "k2", "access_token": "t2"})
        );
        assert_eq!(request.url, "https://app.example.com/me");
        assert_eq!(request.headers.get(API_KEY_HEADER).map(String::as_str), Some("key"));
        assert_eq!(
            request.headers.get(ACCESS_TOKEN_HEADER).map(String::as_str),
            Some("tok")
        );
    }
}
