//! The orchestrator: owns the route table, the match cache, the
//! configuration attribute set and the registered groups, and dispatches
//! localization requests to the owning group.
//!
//! Nothing here is request-global: per-request state (the resolved locale,
//! bound parameters) lives on the `RequestContext` that callers thread
//! through.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::attributes::AttributeSet;
use crate::config::RawAttributes;
use crate::error::{Error, Result};
use crate::group::Group;
use crate::locale::Locale;
use crate::normalizer;
use crate::request::RequestContext;
use crate::routing::{MatchedRoute, Method, Route, RouteMatchCache, RouteTable};

/// Host hook applying a locale's regional identifiers to the platform
/// formatting context (dates, currency). The default is to do nothing.
pub trait RegionalFormatter: fmt::Debug {
    fn apply(&self, locale: &Locale);
}

/// Registers routes on behalf of [`Localizer::define_group`] and records
/// which of them are excluded from localization.
pub struct GroupRegistrar<'a> {
    table: &'a mut RouteTable,
    registered: Vec<Arc<Route>>,
    ignored: BTreeSet<String>,
}

impl GroupRegistrar<'_> {
    /// Register a route as part of the group being defined.
    pub fn register(&mut self, route: Route) -> Arc<Route> {
        let route = self.table.add(route);
        self.registered.push(Arc::clone(&route));
        route
    }

    /// Exclude an already registered route from localization. It stays in
    /// the route table but the group will not own or localize it.
    pub fn ignore(&mut self, route: &Route) {
        self.ignored.insert(route.key());
    }

    /// Register a route and immediately exclude it.
    pub fn register_ignored(&mut self, route: Route) -> Arc<Route> {
        let route = self.register(route);
        self.ignore(&route);
        route
    }

    /// Exclude every route registered inside the block.
    pub fn ignoring<F>(&mut self, register: F)
    where
        F: FnOnce(&mut Self),
    {
        let before = self.registered.len();
        register(self);
        let new_keys: Vec<String> = self.registered[before..]
            .iter()
            .map(|route| route.key())
            .collect();
        self.ignored.extend(new_keys);
    }
}

pub struct Localizer {
    table: RouteTable,
    cache: RouteMatchCache,
    config_attributes: AttributeSet,
    groups: Vec<Group>,
    regional_formatter: Option<Box<dyn RegionalFormatter>>,
}

impl Localizer {
    /// Build from the root configuration, which must be complete.
    pub fn new(config: RawAttributes) -> Result<Self> {
        let config_attributes = normalizer::normalize(config, None)?;
        Ok(Self {
            table: RouteTable::new(),
            cache: RouteMatchCache::new(),
            config_attributes,
            groups: Vec::new(),
            regional_formatter: None,
        })
    }

    pub fn with_regional_formatter(mut self, formatter: impl RegionalFormatter + 'static) -> Self {
        self.regional_formatter = Some(Box::new(formatter));
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Mutable table access for routes outside any localized group.
    pub fn table_mut(&mut self) -> &mut RouteTable {
        &mut self.table
    }

    pub fn cache(&self) -> &RouteMatchCache {
        &self.cache
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    // ==================== Configuration ====================

    pub fn config_attributes(&self) -> &AttributeSet {
        &self.config_attributes
    }

    /// Replace the root configuration wholesale.
    pub fn set_config_attributes(&mut self, config: RawAttributes) -> Result<()> {
        self.config_attributes = normalizer::normalize(config, None)?;
        Ok(())
    }

    /// Replace the configured locale set, keeping everything else.
    pub fn set_config_locales(&mut self, locales: Vec<Locale>) -> Result<()> {
        let partial = RawAttributes::new().with_locales(locales);
        self.config_attributes = normalizer::normalize(partial, Some(&self.config_attributes))?;
        Ok(())
    }

    /// Add locales to the configured set.
    pub fn add_config_locales(&mut self, locales: Vec<Locale>) -> Result<()> {
        let mut all: Vec<Locale> = self
            .config_attributes
            .supported_locales()
            .values()
            .cloned()
            .collect();
        all.extend(locales);
        self.set_config_locales(all)
    }

    /// Change the configured default locale.
    pub fn set_config_default_locale(&mut self, code: &str) -> Result<()> {
        let partial = RawAttributes::new().with_default_locale(code);
        self.config_attributes = normalizer::normalize(partial, Some(&self.config_attributes))?;
        Ok(())
    }

    // ==================== Group Definition ====================

    /// Define a localized route group: the closure registers the canonical
    /// routes, the attributes normalize against the configuration set, and
    /// generation runs immediately.
    pub fn define_group<F>(&mut self, attributes: RawAttributes, register: F) -> Result<&Group>
    where
        F: FnOnce(&mut GroupRegistrar<'_>),
    {
        let attrs = normalizer::normalize(attributes, Some(&self.config_attributes))?;

        let mut registrar = GroupRegistrar {
            table: &mut self.table,
            registered: Vec::new(),
            ignored: BTreeSet::new(),
        };
        register(&mut registrar);
        let GroupRegistrar {
            registered,
            ignored,
            ..
        } = registrar;

        let canonical: Vec<_> = registered
            .into_iter()
            .filter(|route| !ignored.contains(&route.key()))
            .collect();

        debug!(
            canonical = canonical.len(),
            ignored = ignored.len(),
            "defining localized route group"
        );

        let group = Group::build(attrs, canonical, &mut self.table);
        self.groups.push(group);
        Ok(self.groups.last().expect("group was just registered"))
    }

    // ==================== URL Rewriting ====================

    /// Localized form of `url` for `locale`. `None` when the URL matches no
    /// registered route, no group owns it, or the locale is outside the
    /// owning group's supported set. Callers fall back to the input URL.
    pub fn localize(&self, url: &str, locale: &str) -> Option<String> {
        let matched = self.cache.get_or_match(&self.table, Method::Get, url)?;
        let group = self.group_for_route(&matched.route)?;
        if !group.attributes().is_supported(locale) {
            return None;
        }
        group.localize(url, locale, &self.table, &self.cache)
    }

    /// Localize for the request's resolved locale.
    pub fn localize_current(&self, ctx: &RequestContext, url: &str) -> Option<String> {
        let locale = ctx.locale()?;
        self.localize(url, locale)
    }

    /// Canonical form of `url`. URLs owned by no group pass through
    /// unchanged; unmatched URLs yield `None`.
    pub fn delocalize(&self, url: &str) -> Option<String> {
        let matched = self.cache.get_or_match(&self.table, Method::Get, url)?;
        match self.group_for_route(&matched.route) {
            Some(group) => group.delocalize(url, &self.table, &self.cache),
            None => Some(url.to_string()),
        }
    }

    /// Locale-prefixed page path for view/page resolution: dots become
    /// slashes, the locale leads.
    pub fn localized_page_path(&self, path: &str, locale: &str) -> String {
        format!("{locale}/{path}").replace('.', "/")
    }

    // ==================== Membership ====================

    pub fn is_localized_url(&self, url: &str, method: Method) -> bool {
        self.cache
            .get_or_match(&self.table, method, url)
            .map(|matched| self.is_localized_route(&matched.route))
            .unwrap_or(false)
    }

    pub fn is_localized_route(&self, route: &Route) -> bool {
        self.groups.iter().any(|group| group.is_localized_route(route))
    }

    pub fn is_localized_route_name(&self, name: &str) -> bool {
        self.table
            .by_name(name)
            .map(|route| self.is_localized_route(&route))
            .unwrap_or(false)
    }

    pub fn group_for_route(&self, route: &Route) -> Option<&Group> {
        self.groups.iter().find(|group| group.is_localized_route(route))
    }

    // ==================== Request Dispatch ====================

    /// Cached route match for the request's method and URL.
    pub fn match_request(&self, ctx: &RequestContext) -> Option<MatchedRoute> {
        self.cache.get_or_match(&self.table, ctx.method(), ctx.url())
    }

    /// Attributes governing the request: the owning group's set when its
    /// route is localized, the configuration set otherwise.
    pub fn request_attributes(&self, ctx: &RequestContext) -> &AttributeSet {
        self.match_request(ctx)
            .and_then(|matched| self.group_for_route(&matched.route))
            .map(Group::attributes)
            .unwrap_or(&self.config_attributes)
    }

    /// Bind the matched route's parameters onto the context, once.
    pub fn bind_route_params(&self, ctx: &mut RequestContext) {
        if ctx.route_params().is_none() {
            if let Some(matched) = self.match_request(ctx) {
                ctx.set_route_params(matched.params);
            }
        }
    }

    // ==================== Current Locale ====================

    /// Activate a locale for the request: validates it, records it on the
    /// context, persists it into session and cookie, and applies the
    /// regional formatting hook.
    pub fn set_current_locale(&self, ctx: &mut RequestContext, code: &str) -> Result<Locale> {
        let attrs = self.request_attributes(ctx);
        let locale = attrs
            .locale(code)
            .cloned()
            .ok_or_else(|| Error::UnsupportedCurrentLocale(code.to_string()))?;
        let identifier = attrs.locale_identifier().to_string();
        let default_code = attrs.default_locale().code().to_string();

        ctx.set_locale(code, &default_code);
        ctx.session_mut().put(&identifier, code);
        ctx.cookies_mut().set_forever(&identifier, code);

        if let Some(formatter) = &self.regional_formatter {
            formatter.apply(&locale);
        }

        debug!(locale = code, "current locale activated");
        Ok(locale)
    }

    /// The request's resolved locale, if resolution has run.
    pub fn current_locale(&self, ctx: &RequestContext) -> Option<&Locale> {
        let code = ctx.locale()?;
        self.request_attributes(ctx)
            .locale(code)
            .or_else(|| self.config_attributes.locale(code))
    }

    pub fn is_current_locale(&self, ctx: &RequestContext, code: &str) -> bool {
        ctx.locale() == Some(code)
    }

    // ==================== Locale Accessors ====================

    pub fn locale(&self, code: &str) -> Option<&Locale> {
        self.config_attributes.locale(code)
    }

    pub fn supported_locales(&self) -> &BTreeMap<String, Locale> {
        self.config_attributes.supported_locales()
    }

    pub fn default_locale(&self) -> &Locale {
        self.config_attributes.default_locale()
    }

    pub fn is_supported_locale(&self, code: &str) -> bool {
        self.config_attributes.is_supported(code)
    }

    pub fn is_default_locale(&self, code: &str) -> bool {
        self.default_locale().code() == code
    }

    pub fn locale_aliases(&self) -> &BTreeMap<String, String> {
        self.config_attributes.locale_aliases()
    }

    pub fn locales_by_property(&self, property: &str) -> BTreeMap<String, Option<Value>> {
        self.config_attributes.locales_by_property(property)
    }
}

impl fmt::Debug for Localizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Localizer")
            .field("routes", &self.table.len())
            .field("groups", &self.groups.len())
            .field("default_locale", &self.config_attributes.default_locale().code())
            .finish()
    }
}
