use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{invalid_response, SkygearResult};

/// Identity of the signed-in user as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    /// Raw user profile record (`{"_id": "user/<id>", ...}`), `null` when the
    /// server did not send one.
    #[serde(default)]
    pub profile: Value,
}

impl CurrentUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            profile: Value::Null,
        }
    }

    pub fn with_profile(mut self, profile: Value) -> Self {
        self.profile = profile;
        self
    }
}

/// Auth payload sent by the server after a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthResponse {
    pub user: CurrentUser,
    pub access_token: String,
}

impl AuthResponse {
    /// Reads `{"result": {...}}` or the bare result object.
    ///
    /// The user id comes from `user_id`, falling back to the profile's `_id`
    /// with its `user/` prefix removed.
    pub fn from_json(payload: &Value) -> SkygearResult<Self> {
        let result = payload.get("result").unwrap_or(payload);
        let access_token = result
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| invalid_response("auth result is missing access_token"))?
            .to_string();

        let profile = result.get("profile").cloned().unwrap_or(Value::Null);
        let user_id = result
            .get("user_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                profile
                    .get("_id")
                    .and_then(Value::as_str)
                    .map(|id| id.strip_prefix("user/").unwrap_or(id).to_string())
            })
            .filter(|id| !id.is_empty())
            .ok_or_else(|| invalid_response("auth result is missing user_id"))?;

        Ok(Self {
            user: CurrentUser::new(user_id).with_profile(profile),
            access_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_wrapped_result_with_user_id() {
        let response = AuthResponse::from_json(&json!({
            "result": {"user_id": "u1", "access_token": "tok", "profile": {"_id": "user/u1"}}
        }))
        .unwrap();
        assert_eq!(response.user.id, "u1");
        assert_eq!(response.access_token, "tok");
        assert_eq!(response.user.profile, json!({"_id": "user/u1"}));
    }

    #[test]
    fn falls_back_to_profile_id() {
        let response = AuthResponse::from_json(&json!({
            "access_token": "tok", "profile": {"_id": "user/u2", "username": "alice"}
        }))
        .unwrap();
        assert_eq!(response.user.id, "u2");
    }

    #[test]
    fn missing_token_or_user_is_rejected() {
        assert!(AuthResponse::from_json(&json!({"result": {"user_id": "u1"}})).is_err());
        assert!(AuthResponse::from_json(&json!({"result": {"access_token": "tok"}})).is_err());
    }
}
