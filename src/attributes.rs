//! Attribute set governing one localized route group.
//!
//! Every non-root attribute set is produced by the normalizer from a
//! partial input plus a fallback set (see `normalizer`); the root set is
//! built directly from complete configuration. Construction establishes the
//! invariant that the default locale is a member of the supported set, and
//! nothing after construction can break it: all named attributes are
//! immutable, only the extra bag accepts writes.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::locale::Locale;

/// How the locale is carried in a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayMode {
    /// A path segment at a 1-based position.
    Segment(usize),
    /// A query parameter under the given key.
    Query(String),
    /// Not visible in the URL at all.
    Hidden,
}

/// A per-locale override for one canonical route: a replacement path, a
/// replacement domain, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteAlias {
    pub path: Option<String>,
    pub domain: Option<String>,
}

/// Locale code → canonical route key → alias.
pub type RouteAliasMap = BTreeMap<String, BTreeMap<String, RouteAlias>>;

/// Attribute names that may not be overwritten through [`AttributeSet::set`].
const PROTECTED_ATTRIBUTES: [&str; 7] = [
    "supported_locales",
    "default_locale",
    "display",
    "hide_default",
    "route_aliases",
    "locale_identifier",
    "negotiate_aliases",
];

#[derive(Debug, Clone)]
pub struct AttributeSet {
    supported_locales: BTreeMap<String, Locale>,
    default_locale: String,
    display: DisplayMode,
    hide_default: bool,
    route_aliases: RouteAliasMap,
    locale_identifier: String,
    negotiate_aliases: bool,
    locale_aliases: OnceLock<BTreeMap<String, String>>,
    extra: BTreeMap<String, Value>,
}

impl AttributeSet {
    /// Assemble a validated set. Callers (the normalizer) must pass a
    /// `default_locale` that is a key of `supported_locales`; this is the
    /// single place the invariant is established.
    pub(crate) fn new(
        supported_locales: BTreeMap<String, Locale>,
        default_locale: String,
        display: DisplayMode,
        hide_default: bool,
        route_aliases: RouteAliasMap,
        locale_identifier: String,
        negotiate_aliases: bool,
        extra: BTreeMap<String, Value>,
    ) -> Result<Self> {
        if !supported_locales.contains_key(&default_locale) {
            return Err(Error::UnsupportedDefaultLocale(default_locale));
        }
        Ok(Self {
            supported_locales,
            default_locale,
            display,
            hide_default,
            route_aliases,
            locale_identifier,
            negotiate_aliases,
            locale_aliases: OnceLock::new(),
            extra,
        })
    }

    pub fn supported_locales(&self) -> &BTreeMap<String, Locale> {
        &self.supported_locales
    }

    pub fn locale(&self, code: &str) -> Option<&Locale> {
        self.supported_locales.get(code)
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.supported_locales.contains_key(code)
    }

    pub fn default_locale(&self) -> &Locale {
        // Membership is a construction invariant.
        &self.supported_locales[&self.default_locale]
    }

    pub fn display(&self) -> &DisplayMode {
        &self.display
    }

    pub fn hide_default(&self) -> bool {
        self.hide_default
    }

    pub fn route_aliases(&self) -> &RouteAliasMap {
        &self.route_aliases
    }

    /// The alias registered for `code` on the canonical route `route_key`.
    pub fn route_alias(&self, code: &str, route_key: &str) -> Option<&RouteAlias> {
        self.route_aliases.get(code)?.get(route_key)
    }

    /// Key used for locale lookups in session, cookie, body and path
    /// parameters.
    pub fn locale_identifier(&self) -> &str {
        &self.locale_identifier
    }

    /// Whether content negotiation matches client languages against the
    /// alias table (`true`) or against bare locale codes (`false`).
    pub fn negotiate_aliases(&self) -> bool {
        self.negotiate_aliases
    }

    /// Code → display alias for every supported locale, falling back to the
    /// code itself. Computed once.
    pub fn locale_aliases(&self) -> &BTreeMap<String, String> {
        self.locale_aliases.get_or_init(|| {
            self.supported_locales
                .iter()
                .map(|(code, locale)| (code.clone(), locale.alias_or_code().to_string()))
                .collect()
        })
    }

    /// Reverse-map a display alias to its locale code. Returns `None` for
    /// values that are not an alias of any supported locale.
    pub fn code_for_alias(&self, alias: &str) -> Option<&str> {
        self.locale_aliases()
            .iter()
            .find(|(_, a)| a.as_str() == alias)
            .map(|(code, _)| code.as_str())
    }

    /// Code → property value across the supported locales. Locales lacking
    /// the property map to `None`.
    pub fn locales_by_property(&self, property: &str) -> BTreeMap<String, Option<Value>> {
        self.supported_locales
            .iter()
            .map(|(code, locale)| (code.clone(), locale.get(property)))
            .collect()
    }

    /// Look up any attribute by name, named attributes first, then the
    /// extra bag.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "supported_locales" => Some(Value::Array(
                self.supported_locales
                    .keys()
                    .map(|c| Value::String(c.clone()))
                    .collect(),
            )),
            "default_locale" => Some(Value::String(self.default_locale.clone())),
            "display" => Some(match &self.display {
                DisplayMode::Segment(index) => Value::from(*index as u64),
                DisplayMode::Query(query_key) => Value::String(query_key.clone()),
                DisplayMode::Hidden => Value::Null,
            }),
            "hide_default" => Some(Value::Bool(self.hide_default)),
            "locale_identifier" => Some(Value::String(self.locale_identifier.clone())),
            "negotiate_aliases" => Some(Value::Bool(self.negotiate_aliases)),
            _ => self.extra.get(key).cloned(),
        }
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        PROTECTED_ATTRIBUTES.contains(&key) || self.extra.contains_key(key)
    }

    /// Mutate an extra attribute. The named attributes are protected and
    /// fail with [`Error::ImmutableProperty`].
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        if PROTECTED_ATTRIBUTES.contains(&key) {
            return Err(Error::ImmutableProperty(key.to_string()));
        }
        self.extra.insert(key.to_string(), value);
        Ok(())
    }
}
