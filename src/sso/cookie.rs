//! `document.cookie` string helpers.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

// Characters `encodeURIComponent` escapes that may appear in cookie values.
const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b',')
    .add(b';')
    .add(b'\\')
    .add(b'+')
    .add(b'=');

/// Value of cookie `name` in a `document.cookie` string, percent-decoded.
pub fn read(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| {
            let value = value.trim_matches('"');
            percent_decode_str(value).decode_utf8_lossy().into_owned()
        })
}

/// Assignment that stores `value` under `name` for the whole site.
pub fn set_assignment(name: &str, value: &str) -> String {
    format!("{name}={}; path=/", utf8_percent_encode(value, COOKIE_VALUE))
}

/// Assignment that deletes cookie `name`.
pub fn remove_assignment(name: &str) -> String {
    format!("{name}=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/")
}
