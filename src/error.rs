use std::fmt;

use serde_json::Value;

pub type SkygearResult<T> = Result<T, SkygearError>;

/// Numeric error codes returned by the Skygear server inside `{"error": {"code": ...}}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotAuthenticated,
    PermissionDenied,
    AccessKeyNotAccepted,
    AccessTokenNotAccepted,
    InvalidCredentials,
    InvalidSignature,
    BadRequest,
    InvalidArgument,
    Duplicated,
    ResourceNotFound,
    NotSupported,
    NotImplemented,
    ConstraintViolated,
    IncompatibleSchema,
    AtomicOperationFailure,
    PartialOperationFailure,
    UndefinedOperation,
    PluginUnavailable,
    PluginTimeout,
    RecordQueryEmpty,
    PluginInitializing,
    ResponseTimeout,
    DeniedArgument,
    RecordQueryDenied,
    NotConfigured,
    PasswordPolicyViolated,
    UserDisabled,
    VerificationRequired,
    UnexpectedError,
    Other(i64),
}

impl ErrorCode {
    pub fn from_i64(value: i64) -> Self {
        match value {
            101 => ErrorCode::NotAuthenticated,
            102 => ErrorCode::PermissionDenied,
            103 => ErrorCode::AccessKeyNotAccepted,
            104 => ErrorCode::AccessTokenNotAccepted,
            105 => ErrorCode::InvalidCredentials,
            106 => ErrorCode::InvalidSignature,
            107 => ErrorCode::BadRequest,
            108 => ErrorCode::InvalidArgument,
            109 => ErrorCode::Duplicated,
            110 => ErrorCode::ResourceNotFound,
            111 => ErrorCode::NotSupported,
            112 => ErrorCode::NotImplemented,
            113 => ErrorCode::ConstraintViolated,
            114 => ErrorCode::IncompatibleSchema,
            115 => ErrorCode::AtomicOperationFailure,
            116 => ErrorCode::PartialOperationFailure,
            117 => ErrorCode::UndefinedOperation,
            118 => ErrorCode::PluginUnavailable,
            119 => ErrorCode::PluginTimeout,
            120 => ErrorCode::RecordQueryEmpty,
            121 => ErrorCode::PluginInitializing,
            122 => ErrorCode::ResponseTimeout,
            123 => ErrorCode::DeniedArgument,
            124 => ErrorCode::RecordQueryDenied,
            125 => ErrorCode::NotConfigured,
            126 => ErrorCode::PasswordPolicyViolated,
            127 => ErrorCode::UserDisabled,
            128 => ErrorCode::VerificationRequired,
            10000 => ErrorCode::UnexpectedError,
            other => ErrorCode::Other(other),
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            ErrorCode::NotAuthenticated => 101,
            ErrorCode::PermissionDenied => 102,
            ErrorCode::AccessKeyNotAccepted => 103,
            ErrorCode::AccessTokenNotAccepted => 104,
            ErrorCode::InvalidCredentials => 105,
            ErrorCode::InvalidSignature => 106,
            ErrorCode::BadRequest => 107,
            ErrorCode::InvalidArgument => 108,
            ErrorCode::Duplicated => 109,
            ErrorCode::ResourceNotFound => 110,
            ErrorCode::NotSupported => 111,
            ErrorCode::NotImplemented => 112,
            ErrorCode::ConstraintViolated => 113,
            ErrorCode::IncompatibleSchema => 114,
            ErrorCode::AtomicOperationFailure => 115,
            ErrorCode::PartialOperationFailure => 116,
            ErrorCode::UndefinedOperation => 117,
            ErrorCode::PluginUnavailable => 118,
            ErrorCode::PluginTimeout => 119,
            ErrorCode::RecordQueryEmpty => 120,
            ErrorCode::PluginInitializing => 121,
            ErrorCode::ResponseTimeout => 122,
            ErrorCode::DeniedArgument => 123,
            ErrorCode::RecordQueryDenied => 124,
            ErrorCode::NotConfigured => 125,
            ErrorCode::PasswordPolicyViolated => 126,
            ErrorCode::UserDisabled => 127,
            ErrorCode::VerificationRequired => 128,
            ErrorCode::UnexpectedError => 10000,
            ErrorCode::Other(value) => *value,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// Structured error reported by the server in the response body.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerError {
    pub status: Option<u16>,
    pub code: ErrorCode,
    pub name: Option<String>,
    pub message: String,
    pub info: Option<Value>,
}

impl ServerError {
    /// Reads the server's `{code, name, message, info}` error object.
    ///
    /// Returns `None` when the value is not an object; a missing `code` maps to
    /// [`ErrorCode::UnexpectedError`].
    pub fn from_json(status: Option<u16>, value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let code = object
            .get("code")
            .and_then(Value::as_i64)
            .map(ErrorCode::from_i64)
            .unwrap_or(ErrorCode::UnexpectedError);
        let message = object
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown server error")
            .to_string();
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);
        let info = object.get("info").filter(|info| !info.is_null()).cloned();
        Some(Self {
            status,
            code,
            name,
            message,
            info,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SkygearError {
    /// Programmer error in the container configuration, e.g. a missing API key.
    Configuration(String),
    /// Transport-level failure without a structured server error.
    Network {
        status: Option<u16>,
        message: String,
    },
    Server(ServerError),
    /// The login popup was closed before a result was received.
    UserCancelled,
    /// The post-login redirect target is not on the server allow-list.
    UnauthorizedCallbackDomain(String),
    /// The popup callback page found no stashed login result.
    MissingLoginResult,
    InvalidResponse(String),
    Store(String),
    Platform(String),
}

impl SkygearError {
    /// HTTP status associated with the failure, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            SkygearError::Network { status, .. } => *status,
            SkygearError::Server(err) => err.status,
            _ => None,
        }
    }

    /// Server error code, when the failure was classified from a server response.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            SkygearError::Server(err) => Some(err.code),
            _ => None,
        }
    }

    pub fn is_access_token_not_accepted(&self) -> bool {
        self.code() == Some(ErrorCode::AccessTokenNotAccepted)
    }
}

impl fmt::Display for SkygearError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkygearError::Configuration(message) => write!(f, "{message}"),
            SkygearError::Network {
                status: Some(status),
                message,
            } => write!(f, "Network error ({status}): {message}"),
            SkygearError::Network {
                status: None,
                message,
            } => write!(f, "Network error: {message}"),
            SkygearError::Server(err) => write!(f, "{} (code {})", err.message, err.code),
            SkygearError::UserCancelled => write!(f, "User cancel the login flow"),
            SkygearError::UnauthorizedCallbackDomain(url) => write!(
                f,
                "The domain is not authorized. Add it to the authorized callback urls list in portal. Domain: {url}"
            ),
            SkygearError::MissingLoginResult => write!(f, "Fail to retrieve login result"),
            SkygearError::InvalidResponse(message) => write!(f, "Invalid response: {message}"),
            SkygearError::Store(message) => write!(f, "Store error: {message}"),
            SkygearError::Platform(message) => write!(f, "Platform error: {message}"),
        }
    }
}

impl std::error::Error for SkygearError {}

pub fn configuration_error(message: impl Into<String>) -> SkygearError {
    SkygearError::Configuration(message.into())
}

pub fn invalid_response(message: impl Into<String>) -> SkygearError {
    SkygearError::InvalidResponse(message.into())
}

pub fn store_error(message: impl Into<String>) -> SkygearError {
    SkygearError::Store(message.into())
}

pub fn platform_error(message: impl Into<String>) -> SkygearError {
    SkygearError::Platform(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_code_maps_known_and_unknown_values() {
        assert_eq!(ErrorCode::from_i64(104), ErrorCode::AccessTokenNotAccepted);
        assert_eq!(ErrorCode::from_i64(10000), ErrorCode::UnexpectedError);
        assert_eq!(ErrorCode::from_i64(4242), ErrorCode::Other(4242));
        assert_eq!(ErrorCode::Other(4242).as_i64(), 4242);
    }

    #[test]
    fn server_error_reads_body_fields() {
        let err = ServerError::from_json(
            Some(401),
            &json!({"code": 104, "name": "AccessTokenNotAccepted", "message": "token expired"}),
        )
        .unwrap();
        assert_eq!(err.code, ErrorCode::AccessTokenNotAccepted);
        assert_eq!(err.name.as_deref(), Some("AccessTokenNotAccepted"));
        assert_eq!(err.message, "token expired");
        assert_eq!(err.status, Some(401));
    }

    #[test]
    fn server_error_rejects_non_objects() {
        assert!(ServerError::from_json(None, &json!("boom")).is_none());
    }

    #[test]
    fn classified_view_exposes_status_and_code() {
        let err = SkygearError::Server(ServerError {
            status: Some(401),
            code: ErrorCode::AccessTokenNotAccepted,
            name: None,
            message: "expired".into(),
            info: None,
        });
        assert!(err.is_access_token_not_accepted());
        assert_eq!(err.status(), Some(401));
        assert!(!SkygearError::UserCancelled.is_access_token_not_accepted());
    }
}
