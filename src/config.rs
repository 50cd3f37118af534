//! Raw, partially-specified attribute input.
//!
//! `RawAttributes` is what hosts hand to the normalizer: a configuration
//! blob (deserialized from JSON) or a programmatically built partial set.
//! Absent fields inherit from the fallback attribute set during
//! normalization; the root configuration must be complete.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::locale::{Direction, Locale};

/// Raw locale properties as they appear in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLocale {
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    pub native: String,
    pub script: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub regional: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RawLocale {
    /// Build the locale, taking the code from the map key when the
    /// properties did not carry one.
    pub(crate) fn into_locale(self, key: &str) -> Locale {
        let code = self.code.unwrap_or_else(|| key.to_string());
        let mut locale = Locale::new(code, self.name, self.native, self.script);
        if let Some(alias) = self.alias {
            locale = locale.with_alias(alias);
        }
        if let Some(direction) = self.direction {
            let direction = if direction.eq_ignore_ascii_case("rtl") {
                Direction::RightToLeft
            } else {
                Direction::LeftToRight
            };
            locale = locale.with_direction(direction);
        }
        if let Some(regional) = self.regional {
            locale = locale.with_regional(regional);
        }
        for (key, value) in self.extra {
            locale = locale.with_extra(key, value);
        }
        locale
    }
}

/// One `supported_locales` entry: a code resolved against the fallback set,
/// or an inline property map.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawLocaleSpec {
    Code(String),
    Properties(RawLocale),
}

/// The `supported_locales` input as a whole. The `Locales` variant exists
/// for programmatic construction only.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawSupportedLocales {
    Codes(Vec<String>),
    Map(BTreeMap<String, RawLocaleSpec>),
    #[serde(skip)]
    Locales(Vec<Locale>),
}

/// Raw display value: an integer selects a path-segment position, a string
/// selects a query key. An explicit `null` in configuration means hidden.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDisplay {
    Segment(usize),
    Query(String),
}

/// Distinguishes an absent field (inherit) from an explicit `null`
/// (hidden display).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial attribute input; see the module docs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAttributes {
    pub supported_locales: Option<RawSupportedLocales>,
    pub default_locale: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub display: Option<Option<RawDisplay>>,
    pub hide_default: Option<bool>,
    pub route_aliases: Option<BTreeMap<String, BTreeMap<String, String>>>,
    pub locale_identifier: Option<String>,
    pub negotiate_aliases: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RawAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locales(mut self, locales: Vec<Locale>) -> Self {
        self.supported_locales = Some(RawSupportedLocales::Locales(locales));
        self
    }

    pub fn with_locale_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_locales = Some(RawSupportedLocales::Codes(
            codes.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn with_default_locale(mut self, code: impl Into<String>) -> Self {
        self.default_locale = Some(code.into());
        self
    }

    pub fn with_display_segment(mut self, index: usize) -> Self {
        self.display = Some(Some(RawDisplay::Segment(index)));
        self
    }

    pub fn with_display_query(mut self, key: impl Into<String>) -> Self {
        self.display = Some(Some(RawDisplay::Query(key.into())));
        self
    }

    pub fn with_display_hidden(mut self) -> Self {
        self.display = Some(None);
        self
    }

    pub fn with_hide_default(mut self, hide: bool) -> Self {
        self.hide_default = Some(hide);
        self
    }

    pub fn with_locale_identifier(mut self, key: impl Into<String>) -> Self {
        self.locale_identifier = Some(key.into());
        self
    }

    pub fn with_negotiate_aliases(mut self, on_aliases: bool) -> Self {
        self.negotiate_aliases = Some(on_aliases);
        self
    }

    /// Register a per-locale alias for one canonical route.
    pub fn with_route_alias(
        mut self,
        code: impl Into<String>,
        route: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        self.route_aliases
            .get_or_insert_with(BTreeMap::new)
            .entry(code.into())
            .or_default()
            .insert(route.into(), alias.into());
        self
    }
}

/// Parse a configuration blob.
pub fn from_json_str(json: &str) -> serde_json::Result<RawAttributes> {
    serde_json::from_str(json)
}
