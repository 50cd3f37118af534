//! Locale entity: identity plus extensible, lazily derived properties.
//!
//! A `Locale` is constructed once from raw properties and never mutated
//! afterwards, except for its open-ended extra properties. The writing
//! direction and the regional identifier list are derived on first access
//! and memoized.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde_json::Value;

use crate::error::{Error, Result};

/// Writing direction of a locale's script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::LeftToRight => "ltr",
            Direction::RightToLeft => "rtl",
        }
    }
}

/// Scripts written right-to-left. Other (historic) RTL scripts exist, but
/// this list contains the only ones in current use.
const RTL_SCRIPTS: [&str; 4] = ["Arab", "Mong", "Tfng", "Thaa"];

/// Property names that may not be overwritten through [`Locale::set`].
const PROTECTED_PROPERTIES: [&str; 7] = [
    "code", "name", "native", "script", "alias", "direction", "regional",
];

/// A single language/region identity.
///
/// The fixed fields carry the identity; everything else lives in the extra
/// property bag and is reached through [`Locale::get`]. `direction` and
/// `regional` may be supplied explicitly at construction; when absent they
/// are computed from `script` and `code` respectively, once.
#[derive(Debug, Clone)]
pub struct Locale {
    code: String,
    name: String,
    native: String,
    script: String,
    alias: Option<String>,
    direction: OnceLock<Direction>,
    regional: OnceLock<Vec<String>>,
    extra: BTreeMap<String, Value>,
}

impl Locale {
    /// Create a locale from its essential properties.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        native: impl Into<String>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            native: native.into(),
            script: script.into(),
            alias: None,
            direction: OnceLock::new(),
            regional: OnceLock::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Set the display alias substituted for the code in URLs and
    /// negotiation.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Pin the writing direction instead of deriving it from the script.
    pub fn with_direction(self, direction: Direction) -> Self {
        let _ = self.direction.set(direction);
        self
    }

    /// Pin the regional identifiers instead of deriving them from the code.
    /// The `C` and `POSIX` fallbacks are always appended.
    pub fn with_regional(self, regional: Vec<String>) -> Self {
        let mut seeded = regional;
        seeded.push("C".to_string());
        seeded.push("POSIX".to_string());
        let _ = self.regional.set(seeded);
        self
    }

    /// Attach an extra property at construction time.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn native(&self) -> &str {
        &self.native
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The alias when present, the code otherwise. This is the token that
    /// appears in localized URLs.
    pub fn alias_or_code(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.code)
    }

    /// Writing direction, derived from the script when not supplied.
    pub fn direction(&self) -> Direction {
        *self.direction.get_or_init(|| {
            if RTL_SCRIPTS.contains(&self.script.as_str()) {
                Direction::RightToLeft
            } else {
                Direction::LeftToRight
            }
        })
    }

    /// Regional identifiers for platform formatting contexts, derived from
    /// the code when not supplied: snake/kebab variants with `.utf8` and
    /// `.UTF-8` suffixes, then the bare variants, then `C` and `POSIX`.
    pub fn regional(&self) -> &[String] {
        self.regional.get_or_init(|| {
            let snake = self.code.replace('-', "_");
            let kebab = self.code.replace('_', "-");
            vec![
                format!("{snake}.utf8"),
                format!("{snake}.UTF-8"),
                format!("{kebab}.utf8"),
                format!("{kebab}.UTF-8"),
                snake,
                kebab,
                "C".to_string(),
                "POSIX".to_string(),
            ]
        })
    }

    /// Look up any property by name, fixed fields first, then the extra bag.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "code" => Some(Value::String(self.code.clone())),
            "name" => Some(Value::String(self.name.clone())),
            "native" => Some(Value::String(self.native.clone())),
            "script" => Some(Value::String(self.script.clone())),
            "alias" => self.alias.clone().map(Value::String),
            "direction" => Some(Value::String(self.direction().as_str().to_string())),
            "regional" => Some(Value::Array(
                self.regional()
                    .iter()
                    .map(|r| Value::String(r.clone()))
                    .collect(),
            )),
            _ => self.extra.get(key).cloned(),
        }
    }

    /// Whether the property exists, either fixed or extra. Lazily derived
    /// properties count as existing only once computed or supplied.
    pub fn has_property(&self, key: &str) -> bool {
        match key {
            "code" | "name" | "native" | "script" => true,
            "alias" => self.alias.is_some(),
            "direction" => self.direction.get().is_some(),
            "regional" => self.regional.get().is_some(),
            _ => self.extra.contains_key(key),
        }
    }

    /// Mutate an extra property. Fixed and derived properties are protected:
    /// attempting to overwrite one fails with [`Error::ImmutableProperty`].
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        if PROTECTED_PROPERTIES.contains(&key) {
            return Err(Error::ImmutableProperty(key.to_string()));
        }
        self.extra.insert(key.to_string(), value);
        Ok(())
    }

    /// All properties: fixed, derived (forcing computation) and extra.
    pub fn all_properties(&self) -> BTreeMap<String, Value> {
        let mut out = self.extra.clone();
        for key in ["code", "name", "native", "script", "alias", "direction", "regional"] {
            if let Some(value) = self.get(key) {
                out.insert(key.to_string(), value);
            }
        }
        out
    }
}
