//! In-memory route table: registration, name lookup and URL matching.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::routing::{Method, Route};
use crate::urlutil;

/// A successful (method, URL) match: the winning route plus its bound
/// parameters (route defaults filled in).
#[derive(Debug, Clone)]
pub struct MatchedRoute {
    pub route: Arc<Route>,
    pub params: BTreeMap<String, String>,
}

/// The process route table. Registration happens single-threaded at startup;
/// afterwards the table is read-only.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route and hand back its shared handle.
    pub fn add(&mut self, route: Route) -> Arc<Route> {
        let route = Arc::new(route);
        self.routes.push(Arc::clone(&route));
        route
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// First route registered under the given name.
    pub fn by_name(&self, name: &str) -> Option<Arc<Route>> {
        self.routes
            .iter()
            .find(|route| route.name() == Some(name))
            .cloned()
    }

    /// Match a URL against the table in registration order. Fallback routes
    /// never win.
    pub fn match_url(&self, method: Method, url: &str) -> Option<MatchedRoute> {
        let parts = urlutil::split_url(url);
        let segments = parts.path_segments();

        self.routes
            .iter()
            .filter(|route| !route.is_fallback() && route.allows_method(method))
            .find_map(|route| {
                route
                    .matches(parts.host.as_deref(), &segments)
                    .map(|params| MatchedRoute {
                        route: Arc::clone(route),
                        params,
                    })
            })
    }
}
