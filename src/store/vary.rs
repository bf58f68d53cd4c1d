//! Vary negotiation between request header sets

use crate::message::{normalize_name, Headers};

/// Header names listed in a `Vary` value, normalized
pub fn vary_header_names(vary: &str) -> impl Iterator<Item = String> + '_ {
    vary.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|name| !name.is_empty())
        .map(normalize_name)
}

/// Whether two request header sets select the same variant under `vary`
///
/// An empty `vary` always matches. Otherwise every named header must agree
/// on its values; an absent header only equals an absent header.
pub fn requests_match(vary: &str, a: &Headers, b: &Headers) -> bool {
    vary_header_names(vary).all(|name| a.get_all(&name) == b.get_all(&name))
}
