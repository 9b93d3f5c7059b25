//! `k=<key>` handling for share URL fragments.
//!
//! Fragments are treated as `&`-separated `name=value` pairs. Values are taken
//! literally: base64url keys never need percent-decoding.

/// Fragment parameter that carries the share key.
pub const FRAGMENT_KEY_PARAM: &str = "k";

/// Fragment text (without `#`) carrying `encoded_key`.
pub fn build_fragment(encoded_key: &str) -> String {
    format!("{FRAGMENT_KEY_PARAM}={encoded_key}")
}

fn pairs(hash: &str) -> impl Iterator<Item = (&str, &str)> {
    hash.strip_prefix('#')
        .unwrap_or(hash)
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}

/// First non-empty `k` value in a URL fragment, with or without leading `#`.
pub fn extract_fragment_key(hash: &str) -> Option<String> {
    pairs(hash)
        .find(|(name, _)| *name == FRAGMENT_KEY_PARAM)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Remove every `k` pair, returning the remaining fragment without `#`.
pub fn strip_fragment_key(hash: &str) -> String {
    hash.strip_prefix('#')
        .unwrap_or(hash)
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split_once('=').map_or(*pair, |(name, _)| name) != FRAGMENT_KEY_PARAM)
        .collect::<Vec<_>>()
        .join("&")
}
