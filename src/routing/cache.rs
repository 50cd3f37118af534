//! Process-wide route-match cache.
//!
//! Pure memoization keyed by (method, URL): the same key always resolves to
//! the same route, so entries are never invalidated or evicted. The mutex
//! makes it safe to share across request threads; misses compute under the
//! lock, which is fine because matching is pure and cheap.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::trace;

use crate::routing::{MatchedRoute, Method, RouteTable};

#[derive(Debug, Default)]
pub struct RouteMatchCache {
    inner: Mutex<HashMap<(Method, String), Option<MatchedRoute>>>,
}

impl RouteMatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached match for (method, url), computing and memoizing on miss.
    pub fn get_or_match(
        &self,
        table: &RouteTable,
        method: Method,
        url: &str,
    ) -> Option<MatchedRoute> {
        let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let key = (method, url.to_string());
        if let Some(cached) = cache.get(&key) {
            return cached.clone();
        }

        trace!(%method, url, "route match cache miss");
        let result = table.match_url(method, url);
        cache.insert(key, result.clone());
        result
    }

    /// Number of memoized keys, hits and misses alike.
    pub fn entries(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
