/// Checks if an on-disk key matches a subscription pattern
///
/// Keys and patterns are compared segment by segment on `.`; a `*` segment
/// matches any segment, and a pattern of `*` alone matches every key.
///
/// # Examples
/// * `"WebApp.Port"` matches `"WebApp.Port"`
/// * `"WebApp.Port"` matches `"WebApp.*"`
/// * `"Volume"` matches `"*"`
pub(super) fn path_matches(key: &str, pattern: &str) -> bool {
    const WILDCARD: &str = "*";

    if pattern == WILDCARD {
        return true;
    }

    let key_parts: Vec<&str> = key.split('.').collect();
    let pattern_parts: Vec<&str> = pattern.split('.').collect();

    if pattern_parts.len() > key_parts.len() {
        return false;
    }

    key_parts
        .iter()
        .zip(pattern_parts.iter())
        .all(|(key_part, pattern_part)| *pattern_part == WILDCARD || key_part == pattern_part)
}
