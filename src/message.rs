//! Request and response model seen by the store
//!
//! Header names are normalized on the way in (lowercase, `_` becomes `-`),
//! so every lookup, snapshot and vary comparison works on one spelling.

use crate::error::{CachetError, CachetResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Normalize a header name the way the store compares them
pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('_', "-")
}

/// Multi-valued header map with normalized names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, Vec<String>>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all values of `name` with `value`
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(normalize_name(name), vec![value.into()]);
    }

    /// Add `value` after any existing values of `name`
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.0
            .entry(normalize_name(name))
            .or_default()
            .push(value.into());
    }

    /// All values of `name`, `None` when the header is absent
    pub fn get_all(&self, name: &str) -> Option<&Vec<String>> {
        self.0.get(&normalize_name(name))
    }

    /// First value of `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&normalize_name(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.0.remove(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name.as_ref(), value);
        }
        headers
    }
}

/// An incoming request, reduced to what the store needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRequest {
    method: String,
    scheme: String,
    host: String,
    uri: String,
    headers: Headers,
}

impl CacheRequest {
    /// Build a request for `url` with the given method
    ///
    /// `host` keeps an explicit non-default port; `uri` is the path plus
    /// query string.
    pub fn new(method: &str, url: &str) -> CachetResult<Self> {
        let parsed = Url::parse(url).map_err(|e| CachetError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let host = parsed.host_str().ok_or_else(|| CachetError::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        })?;
        let host = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let uri = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        };

        Ok(Self {
            method: method.to_ascii_uppercase(),
            scheme: parsed.scheme().to_string(),
            host,
            uri,
            headers: Headers::new(),
        })
    }

    /// Shorthand for a GET request
    pub fn get(url: &str) -> CachetResult<Self> {
        Self::new("GET", url)
    }

    /// Add a request header (builder style)
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Path and query string
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// `scheme://host[:port]/path?query`
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.uri)
    }
}

/// A response as the store persists and reconstructs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// Add a response header (builder style)
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// First value of response header `name`
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}
