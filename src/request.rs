//! Request-scoped context and the session/cookie store contracts.
//!
//! `RequestContext` replaces any process-global "current locale" state:
//! everything a request resolves is carried here and threaded through the
//! pipeline by reference. The store traits are the narrow surface the core
//! needs from the host's session and cookie machinery; the in-memory
//! implementations serve tests and simple hosts.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::routing::Method;
use crate::urlutil;

/// Key/value session access. `reflash` keeps transient (flashed) state
/// alive for one more request; it is called before a normalizing redirect.
pub trait SessionStore: fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&mut self, key: &str, value: &str);
    fn reflash(&mut self);
}

/// Key/value cookie access. `set_forever` persists with a far-future
/// expiry.
pub trait CookieStore: fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn set_forever(&mut self, key: &str, value: &str);
}

/// In-memory session store. Clones share state, so tests can keep a handle
/// and inspect what the pipeline persisted.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    inner: Arc<Mutex<MemorySessionInner>>,
}

#[derive(Debug, Default)]
struct MemorySessionInner {
    values: BTreeMap<String, String>,
    reflashed: bool,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value, e.g. a locale remembered from a previous request.
    pub fn insert(&self, key: &str, value: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.values.insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.values.get(key).cloned()
    }

    pub fn was_reflashed(&self) -> bool {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).reflashed
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.value(key)
    }

    fn put(&mut self, key: &str, value: &str) {
        self.insert(key, value);
    }

    fn reflash(&mut self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).reflashed = true;
    }
}

/// In-memory cookie store; same sharing behavior as [`MemorySession`].
#[derive(Debug, Clone, Default)]
pub struct MemoryCookies {
    inner: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.get(key).cloned()
    }
}

impl CookieStore for MemoryCookies {
    fn get(&self, key: &str) -> Option<String> {
        self.value(key)
    }

    fn set_forever(&mut self, key: &str, value: &str) {
        self.insert(key, value);
    }
}

/// One inbound request: method, URL, input accessors and the locale state
/// resolved for it.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    url: String,
    query: BTreeMap<String, String>,
    body: BTreeMap<String, String>,
    preferred_languages: Vec<String>,
    session: Box<dyn SessionStore>,
    cookies: Box<dyn CookieStore>,
    route_params: Option<BTreeMap<String, String>>,
    active_locale: Option<String>,
    fallback_locale: Option<String>,
}

impl RequestContext {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        let url = url.into();
        let query = urlutil::split_url(&url)
            .query
            .as_deref()
            .map(urlutil::parse_query)
            .unwrap_or_default();

        Self {
            method,
            url,
            query,
            body: BTreeMap::new(),
            preferred_languages: Vec::new(),
            session: Box::new(MemorySession::new()),
            cookies: Box::new(MemoryCookies::new()),
            route_params: None,
            active_locale: None,
            fallback_locale: None,
        }
    }

    /// Shorthand for a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn with_session(mut self, session: impl SessionStore + 'static) -> Self {
        self.session = Box::new(session);
        self
    }

    pub fn with_cookies(mut self, cookies: impl CookieStore + 'static) -> Self {
        self.cookies = Box::new(cookies);
        self
    }

    /// Attach a parsed body field (form input of a non-GET request).
    pub fn with_body_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    /// Parse an `Accept-Language` header into an ordered preference list.
    pub fn with_accept_language(mut self, header: &str) -> Self {
        let mut weighted: Vec<(String, f32)> = header
            .split(',')
            .filter_map(|entry| {
                let entry = entry.trim();
                if entry.is_empty() || entry == "*" {
                    return None;
                }
                let (tag, weight) = match entry.split_once(';') {
                    Some((tag, params)) => {
                        let weight = params
                            .trim()
                            .strip_prefix("q=")
                            .and_then(|q| q.trim().parse::<f32>().ok())
                            .unwrap_or(1.0);
                        (tag.trim(), weight)
                    }
                    None => (entry, 1.0),
                };
                Some((tag.to_string(), weight))
            })
            .collect();

        // Stable sort: equal weights keep header order.
        weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        self.preferred_languages = weighted.into_iter().map(|(tag, _)| tag).collect();
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Decoded path segments of the request URL.
    pub fn segments(&self) -> Vec<String> {
        urlutil::split_url(&self.url).path_segments()
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn body_value(&self, key: &str) -> Option<&str> {
        self.body.get(key).map(String::as_str)
    }

    pub fn preferred_languages(&self) -> &[String] {
        &self.preferred_languages
    }

    /// Pick the client's preferred entry out of `available`, in preference
    /// order: exact tag match first, then primary-subtag match (`en-US`
    /// accepts `en` and vice versa).
    pub fn preferred_language(&self, available: &[String]) -> Option<String> {
        for preferred in &self.preferred_languages {
            let preferred = preferred.replace('_', "-");
            if let Some(hit) = available
                .iter()
                .find(|a| a.replace('_', "-").eq_ignore_ascii_case(&preferred))
            {
                return Some(hit.clone());
            }
            let primary = preferred.split('-').next().unwrap_or(&preferred);
            if let Some(hit) = available.iter().find(|a| {
                let a = a.replace('_', "-");
                a.split('-').next().unwrap_or(&a).eq_ignore_ascii_case(primary)
            }) {
                return Some(hit.clone());
            }
        }
        None
    }

    pub fn session(&self) -> &dyn SessionStore {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> &mut dyn SessionStore {
        self.session.as_mut()
    }

    pub fn cookies(&self) -> &dyn CookieStore {
        self.cookies.as_ref()
    }

    pub fn cookies_mut(&mut self) -> &mut dyn CookieStore {
        self.cookies.as_mut()
    }

    /// The locale code resolved for this request, if any.
    pub fn locale(&self) -> Option<&str> {
        self.active_locale.as_deref()
    }

    /// Fallback code set alongside the active locale (the group default).
    pub fn fallback_locale(&self) -> Option<&str> {
        self.fallback_locale.as_deref()
    }

    pub(crate) fn set_locale(&mut self, code: &str, fallback: &str) {
        self.active_locale = Some(code.to_string());
        self.fallback_locale = Some(fallback.to_string());
    }

    /// Parameters bound by route matching, once bound.
    pub fn route_params(&self) -> Option<&BTreeMap<String, String>> {
        self.route_params.as_ref()
    }

    pub fn set_route_params(&mut self, params: BTreeMap<String, String>) {
        self.route_params = Some(params);
    }

    pub fn route_param(&self, key: &str) -> Option<&str> {
        self.route_params.as_ref()?.get(key).map(String::as_str)
    }

    /// Drop a bound parameter so it does not leak into downstream binding.
    pub fn forget_route_param(&mut self, key: &str) {
        if let Some(params) = self.route_params.as_mut() {
            params.remove(key);
        }
    }
}
