//! Response freshness
//!
//! The store does not decide freshness for serving; the gateway does. It
//! only needs enough of it to force-expire entries on invalidation, so the
//! rules sit behind a trait the embedding gateway can replace.

use crate::message::CachedResponse;
use chrono::{DateTime, Utc};

/// Freshness rules applied by `CacheStore::invalidate`
pub trait FreshnessPolicy: Send + Sync {
    /// Whether `response` may still be served without revalidation
    fn is_fresh(&self, response: &CachedResponse) -> bool;

    /// Mark `response` stale in a way that survives persistence
    fn expire(&self, response: &mut CachedResponse);
}

/// HTTP/1.1 expiration model: `s-maxage`, `max-age`, `Expires`, `Age`, `Date`
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFreshness {
    fixed_now: Option<DateTime<Utc>>,
}

impl HttpFreshness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate against a fixed clock
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            fixed_now: Some(now),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    /// Seconds the response is fresh for, counted from its `Date`
    pub fn max_age(&self, response: &CachedResponse) -> Option<i64> {
        let directive = |name: &str| {
            cache_control(response, name).and_then(|v| v.and_then(|v| v.parse::<i64>().ok()))
        };

        if let Some(age) = directive("s-maxage").or_else(|| directive("max-age")) {
            return Some(age);
        }

        let expires = response.header("expires")?;
        match parse_http_date(expires) {
            Some(expires) => Some((expires - self.date(response)).num_seconds()),
            // An unparsable Expires means already expired
            None => Some(0),
        }
    }

    /// Current age in seconds
    pub fn age(&self, response: &CachedResponse) -> i64 {
        if let Some(age) = response.header("age").and_then(|v| v.trim().parse::<i64>().ok()) {
            return age.max(0);
        }
        (self.now() - self.date(response)).num_seconds().max(0)
    }

    /// Remaining freshness lifetime in seconds
    pub fn ttl(&self, response: &CachedResponse) -> Option<i64> {
        self.max_age(response).map(|max_age| max_age - self.age(response))
    }

    fn date(&self, response: &CachedResponse) -> DateTime<Utc> {
        response
            .header("date")
            .and_then(parse_http_date)
            .unwrap_or_else(|| self.now())
    }
}

impl FreshnessPolicy for HttpFreshness {
    fn is_fresh(&self, response: &CachedResponse) -> bool {
        self.ttl(response).is_some_and(|ttl| ttl > 0)
    }

    fn expire(&self, response: &mut CachedResponse) {
        if !self.is_fresh(response) {
            return;
        }
        if let Some(max_age) = self.max_age(response) {
            response.headers.set("age", max_age.to_string());
        }
        response.headers.remove("expires");
    }
}

/// Look up a `Cache-Control` directive
///
/// `None` when absent, `Some(None)` for a bare directive, `Some(Some(v))`
/// for `name=v`.
fn cache_control<'a>(response: &'a CachedResponse, name: &str) -> Option<Option<&'a str>> {
    response
        .headers
        .get_all("cache-control")?
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .find_map(|directive| {
            let (key, value) = match directive.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim().trim_matches('"'))),
                None => (directive, None),
            };
            key.eq_ignore_ascii_case(name).then_some(value)
        })
}

/// Parse an IMF-fixdate / RFC 2822 date
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a date as an IMF-fixdate
pub fn format_http_date(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
