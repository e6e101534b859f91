pub mod base64;
pub mod json;

pub use base64::{base64_decode, base64_decode_json, base64_encode, DecodeBase64Error};
pub use json::{assign, parse_or_empty};
