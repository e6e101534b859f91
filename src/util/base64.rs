use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::engine::Engine as _;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeBase64Error;

impl fmt::Display for DecodeBase64Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to decode base64 string")
    }
}

impl std::error::Error for DecodeBase64Error {}

/// Encodes a string with the standard alphabet (what the browser's `btoa` produces).
pub fn base64_encode(input: &str) -> String {
    STANDARD.encode(input.as_bytes())
}

/// Decodes standard or URL-safe base64 into UTF-8 text.
///
/// Missing padding is restored before decoding.
pub fn base64_decode(input: &str) -> Result<String, DecodeBase64Error> {
    let mut normalized = input.trim().to_string();
    let remainder = normalized.len() % 4;
    if remainder != 0 {
        normalized.extend("====".chars().take(4 - remainder));
    }
    let bytes = STANDARD
        .decode(normalized.as_bytes())
        .or_else(|_| URL_SAFE.decode(normalized.as_bytes()))
        .map_err(|_err| DecodeBase64Error)?;
    String::from_utf8(bytes).map_err(|_err| DecodeBase64Error)
}

/// Decodes a base64 payload holding a JSON document.
pub fn base64_decode_json(input: &str) -> Result<Value, DecodeBase64Error> {
    let text = base64_decode(input)?;
    serde_json::from_str(&text).map_err(|_err| DecodeBase64Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_browser_encoded_json() {
        let encoded = base64_encode(r#"{"result":{"access_token":"tok"}}"#);
        let decoded = base64_decode_json(&encoded).unwrap();
        assert_eq!(decoded, json!({"result": {"access_token": "tok"}}));
    }

    #[test]
    fn tolerates_missing_padding() {
        let encoded = base64_encode("data");
        let decoded = base64_decode(encoded.trim_end_matches('=')).unwrap();
        assert_eq!(decoded, "data");
    }

    #[test]
    fn accepts_url_safe_alphabet() {
        let encoded = URL_SAFE.encode("??>>".as_bytes());
        assert_eq!(base64_decode(&encoded).unwrap(), "??>>");
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(base64_decode("@@invalid@@").is_err());
        assert!(base64_decode_json(&base64_encode("not json")).is_err());
    }
}
