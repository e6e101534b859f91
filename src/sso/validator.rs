/// Whether `url` starts with one of the `allow_list` entries, ignoring ASCII case.
///
/// A missing or empty URL never matches. Empty entries are skipped.
pub fn is_allowed(url: Option<&str>, allow_list: &[String]) -> bool {
    let Some(url) = url.filter(|url| !url.is_empty()) else {
        return false;
    };
    allow_list
        .iter()
        .filter(|entry| !entry.is_empty())
        .any(|entry| has_prefix_ignore_case(url, entry))
}

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}
