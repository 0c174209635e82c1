//! Cache key construction
//!
//! Keys have the shape `<resource>:<param1>:<param2>...`. Every parameter is
//! trimmed and lowercased before it is appended, so inputs that differ only in
//! case or surrounding whitespace share a key. `:` and `%` inside a parameter are
//! percent-escaped so distinct parameter lists never join to the same string.

use std::fmt;

/// Separator between key segments
const SEPARATOR: char = ':';

/// Normalizes a user-supplied parameter (trim + lowercase)
pub fn normalize_param(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Escapes characters that would make segment boundaries ambiguous
fn escape_segment(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            SEPARATOR => escaped.push_str("%3A"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Builder for colon-delimited cache keys
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    segments: Vec<String>,
}

impl CacheKey {
    /// Starts a key for the given resource kind (e.g. "crypto", "user")
    pub fn new(resource: &str) -> Self {
        Self {
            segments: vec![escape_segment(&normalize_param(resource))],
        }
    }

    /// Appends a parameter that affects the response
    pub fn param(mut self, value: impl fmt::Display) -> Self {
        let normalized = normalize_param(&value.to_string());
        self.segments.push(escape_segment(&normalized));
        self
    }

    /// Returns the finished key string
    pub fn build(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// Key for the top-coins price snapshot
pub fn crypto_prices() -> String {
    CacheKey::new("crypto").param("prices").build()
}

/// Key for a coin's price history over `days`
pub fn crypto_history(coin_id: &str, days: u32) -> String {
    CacheKey::new("crypto")
        .param("history")
        .param(coin_id)
        .param(days)
        .build()
}

/// Key for a GitHub profile plus its star total
pub fn github_user(login: &str) -> String {
    CacheKey::new("user").param(login).build()
}

/// Key for one page of a user's repositories
pub fn github_repos(login: &str, page: u32) -> String {
    CacheKey::new("repos").param(login).param(page).build()
}

/// Key for a transformed chart series
pub fn chart(coin_id: &str, days: u32) -> String {
    CacheKey::new("chart").param(coin_id).param(days).build()
}
