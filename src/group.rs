//! A localized route group: one attribute set, the routes it owns, and the
//! bidirectional canonical ↔ localized mapping.
//!
//! Generation runs once at registration time. In segment mode each locale
//! either gets a concrete route (named source, or an alias that changes the
//! path or domain) or is deferred to a single shared placeholder route whose
//! locale segment is constrained to the deferred locales' aliases. In hidden
//! mode only alias-bearing locales get a route of their own. In query mode
//! the canonical route serves every locale.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use crate::attributes::{AttributeSet, DisplayMode};
use crate::routing::{Constraint, Method, Route, RouteMatchCache, RouteTable};
use crate::urlutil::{self, UrlParts};

#[derive(Debug)]
pub struct Group {
    attributes: AttributeSet,
    routes: Vec<Arc<Route>>,
    route_keys: BTreeSet<String>,
    forward: BTreeMap<String, BTreeMap<String, Arc<Route>>>,
    reverse: BTreeMap<String, Arc<Route>>,
}

impl Group {
    /// Build the group from its canonical routes, generating localized
    /// variants into the table. Runs once; the maps are read-only afterwards.
    pub(crate) fn build(
        attributes: AttributeSet,
        canonical: Vec<Arc<Route>>,
        table: &mut RouteTable,
    ) -> Self {
        let mut group = Self {
            attributes,
            routes: Vec::new(),
            route_keys: BTreeSet::new(),
            forward: BTreeMap::new(),
            reverse: BTreeMap::new(),
        };

        for route in canonical {
            group.track(&route);

            if route.is_fallback() || !route.allows_method(Method::Get) {
                continue;
            }

            match group.attributes.display().clone() {
                DisplayMode::Segment(index) => group.generate_segment_routes(&route, index, table),
                DisplayMode::Hidden => group.generate_hidden_routes(&route, table),
                DisplayMode::Query(_) => {}
            }
        }

        debug!(
            routes = group.routes.len(),
            generated = group.reverse.len(),
            "localized route group built"
        );
        group
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Every route the group owns: canonical and generated.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    fn track(&mut self, route: &Arc<Route>) {
        self.route_keys.insert(route.key());
        self.routes.push(Arc::clone(route));
    }

    fn add_lookups<I>(&mut self, canonical: &Arc<Route>, localized: &Arc<Route>, codes: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.track(localized);
        let canonical_key = canonical.key();
        for code in codes {
            self.forward
                .entry(canonical_key.clone())
                .or_default()
                .insert(code, Arc::clone(localized));
        }
        self.reverse.insert(localized.key(), Arc::clone(canonical));
    }

    fn generate_segment_routes(&mut self, source: &Arc<Route>, index: usize, table: &mut RouteTable) {
        let locale_aliases = self.attributes.locale_aliases().clone();
        let identifier = self.attributes.locale_identifier().to_string();
        let source_key = source.key();
        let is_named = source.name().is_some();

        // Locales served by the shared placeholder route, alias per code.
        let mut deferred: BTreeMap<String, String> = BTreeMap::new();

        for (code, alias) in locale_aliases {
            let route_alias = self.attributes.route_alias(&code, &source_key);
            let alias_path = route_alias
                .and_then(|a| a.path.clone())
                .filter(|p| !urlutil::same_path(p, source.path()));
            let alias_domain = route_alias.and_then(|a| a.domain.clone());

            if is_named || alias_path.is_some() || alias_domain.is_some() {
                let base = alias_path.as_deref().unwrap_or_else(|| source.path());
                let localized_path = urlutil::insert_segment(base, &alias, index);
                let mut localized = derive_route(source, &localized_path, alias_domain);
                if let Some(name) = source.name() {
                    localized = localized.with_name(format!("{name}.{code}"));
                }
                let localized = table.add(localized);
                self.add_lookups(source, &localized, std::iter::once(code));
            } else {
                deferred.insert(code, alias);
            }
        }

        if !deferred.is_empty() {
            let placeholder_path =
                urlutil::insert_segment(source.path(), &format!("{{{identifier}}}"), index);
            let localized = derive_route(source, &placeholder_path, None).with_constraint(
                identifier,
                Constraint::one_of(deferred.values().cloned()),
            );
            let localized = table.add(localized);
            self.add_lookups(source, &localized, deferred.into_keys());
        }
    }

    fn generate_hidden_routes(&mut self, source: &Arc<Route>, table: &mut RouteTable) {
        let codes: Vec<String> = self.attributes.supported_locales().keys().cloned().collect();
        let source_key = source.key();

        for code in codes {
            let Some(route_alias) = self.attributes.route_alias(&code, &source_key).cloned() else {
                continue;
            };
            let alias_path = route_alias
                .path
                .filter(|p| !urlutil::same_path(p, source.path()));
            let alias_domain = route_alias.domain;

            // Locales without a path or domain change share the canonical
            // route and are told apart by the resolved locale alone.
            if alias_path.is_none() && alias_domain.is_none() {
                continue;
            }

            let path = alias_path.as_deref().unwrap_or_else(|| source.path()).to_string();
            let mut localized = derive_route(source, &path, alias_domain);
            if let Some(name) = source.name() {
                localized = localized.with_name(format!("{name}.{code}"));
            }
            let localized = table.add(localized);
            self.add_lookups(source, &localized, std::iter::once(code));
        }
    }

    /// Localized form of `url` for `locale`. `None` when the URL does not
    /// match a registered GET route or the locale is not supported here.
    pub fn localize(
        &self,
        url: &str,
        locale: &str,
        table: &RouteTable,
        cache: &RouteMatchCache,
    ) -> Option<String> {
        let attrs = &self.attributes;

        if attrs.hide_default() && attrs.default_locale().code() == locale {
            return self.delocalize(url, table, cache);
        }

        let alias = attrs.locale_aliases().get(locale)?.clone();
        let matched = cache.get_or_match(table, Method::Get, url)?;
        let parts = urlutil::split_url(url);
        let mut queries = parts
            .query
            .as_deref()
            .map(urlutil::parse_query)
            .unwrap_or_default();
        let mut params = matched.params.clone();
        let identifier = attrs.locale_identifier();

        let target = match attrs.display() {
            DisplayMode::Segment(_) => {
                let canonical = self.reverse.get(&matched.route.key()).unwrap_or(&matched.route);
                let target = self.forward.get(&canonical.key())?.get(locale)?;
                params.remove(identifier);
                if target.has_param(identifier) {
                    // Placeholder route: the locale travels as a bound
                    // parameter carrying the alias.
                    params.insert(identifier.to_string(), alias);
                }
                Arc::clone(target)
            }
            DisplayMode::Query(key) => {
                queries.insert(key.clone(), alias);
                Arc::clone(&matched.route)
            }
            DisplayMode::Hidden => {
                let canonical = self.reverse.get(&matched.route.key()).unwrap_or(&matched.route);
                let target = self
                    .forward
                    .get(&canonical.key())
                    .and_then(|by_locale| by_locale.get(locale))
                    .unwrap_or(canonical);
                Arc::clone(target)
            }
        };

        Some(render_url(&target, &params, &queries, &parts))
    }

    /// Canonical (non-localized) form of `url`. URLs matching routes outside
    /// this group pass through unchanged; unmatched URLs yield `None`.
    pub fn delocalize(
        &self,
        url: &str,
        table: &RouteTable,
        cache: &RouteMatchCache,
    ) -> Option<String> {
        let matched = cache.get_or_match(table, Method::Get, url)?;
        if !self.is_localized_route(&matched.route) {
            return Some(url.to_string());
        }

        let parts = urlutil::split_url(url);
        let mut queries = parts
            .query
            .as_deref()
            .map(urlutil::parse_query)
            .unwrap_or_default();
        let mut params = matched.params.clone();
        let mut target = Arc::clone(&matched.route);

        match self.attributes.display() {
            DisplayMode::Query(key) => {
                queries.remove(key);
            }
            DisplayMode::Segment(_) => {
                if let Some(canonical) = self.reverse.get(&target.key()) {
                    target = Arc::clone(canonical);
                }
                params.remove(self.attributes.locale_identifier());
            }
            DisplayMode::Hidden => {
                if let Some(canonical) = self.reverse.get(&target.key()) {
                    target = Arc::clone(canonical);
                }
            }
        }

        Some(render_url(&target, &params, &queries, &parts))
    }

    /// Whether the route belongs to this group, canonical or generated.
    pub fn is_localized_route(&self, route: &Route) -> bool {
        self.route_keys.contains(&route.key())
    }

    /// Whether the URL resolves to a route of this group under `method`.
    pub fn is_localized_url(
        &self,
        url: &str,
        method: Method,
        table: &RouteTable,
        cache: &RouteMatchCache,
    ) -> bool {
        cache
            .get_or_match(table, method, url)
            .map(|matched| self.is_localized_route(&matched.route))
            .unwrap_or(false)
    }

    /// The localized route registered for (canonical key, locale), if any.
    pub fn localized_route(&self, canonical_key: &str, locale: &str) -> Option<&Arc<Route>> {
        self.forward.get(canonical_key)?.get(locale)
    }

    /// The canonical route behind a localized route key, if any.
    pub fn canonical_route(&self, localized_key: &str) -> Option<&Arc<Route>> {
        self.reverse.get(localized_key)
    }
}

/// Copy everything but the path from the source route: action, defaults,
/// constraints and (unless overridden) the domain.
fn derive_route(source: &Route, path: &str, domain_override: Option<String>) -> Route {
    let mut route = Route::get(path).with_action(source.action().to_string());

    if let Some(domain) = domain_override.or_else(|| source.domain().map(str::to_string)) {
        route = route.with_domain(domain);
    }
    for (param, value) in source.defaults() {
        route = route.with_default(param.clone(), value.clone());
    }
    for (param, constraint) in source.constraints() {
        route = route.with_constraint(param.clone(), constraint.clone());
    }
    route
}

/// Re-render a URL from a target route plus bound parameters and query map,
/// keeping the original scheme/host unless the route is domain-bound.
/// The result is percent-decoded for readability.
fn render_url(
    route: &Route,
    params: &BTreeMap<String, String>,
    queries: &BTreeMap<String, String>,
    original: &UrlParts,
) -> String {
    let path = route.render(params);
    let host = route
        .domain()
        .map(str::to_string)
        .or_else(|| original.host.clone());

    let mut url = match host {
        Some(host) => {
            let scheme = original.scheme.clone().unwrap_or_else(|| "https".to_string());
            format!("{scheme}://{host}/{path}")
        }
        None => format!("/{path}"),
    };

    if !queries.is_empty() {
        url.push('?');
        url.push_str(&urlutil::render_query(queries));
    }

    urlutil::percent_decode(&url, false)
}
