//! Attribute normalization: partial input + fallback set → complete,
//! validated [`AttributeSet`].
//!
//! Group attribute sets inherit anything they do not override from the
//! process configuration set; the configuration set itself normalizes with
//! no fallback and must therefore be complete.

use std::collections::BTreeMap;

use tracing::warn;

use crate::attributes::{AttributeSet, DisplayMode, RouteAlias, RouteAliasMap};
use crate::config::{RawAttributes, RawDisplay, RawLocaleSpec, RawSupportedLocales};
use crate::error::{Error, Result};
use crate::locale::Locale;
use crate::routing::route_key;
use crate::urlutil;

/// Normalize a partial attribute input against a fallback set. Pass `None`
/// for the root configuration set.
pub fn normalize(partial: RawAttributes, fallback: Option<&AttributeSet>) -> Result<AttributeSet> {
    let supported_locales = match partial.supported_locales {
        Some(input) => normalize_supported(input, fallback)?,
        None => fallback
            .map(|f| f.supported_locales().clone())
            .ok_or(Error::MissingAttribute("supported_locales"))?,
    };

    let default_locale = match partial.default_locale {
        Some(code) => code,
        None => fallback
            .map(|f| f.default_locale().code().to_string())
            .ok_or(Error::MissingAttribute("default_locale"))?,
    };

    let display = match partial.display {
        Some(Some(RawDisplay::Segment(index))) => DisplayMode::Segment(index),
        Some(Some(RawDisplay::Query(key))) => DisplayMode::Query(key),
        Some(None) => DisplayMode::Hidden,
        None => fallback
            .map(|f| f.display().clone())
            .ok_or(Error::MissingAttribute("display"))?,
    };

    let hide_default = match partial.hide_default {
        Some(hide) => hide,
        None => fallback
            .map(AttributeSet::hide_default)
            .ok_or(Error::MissingAttribute("hide_default"))?,
    };

    let locale_identifier = match partial.locale_identifier {
        Some(key) => key,
        None => fallback
            .map(|f| f.locale_identifier().to_string())
            .ok_or(Error::MissingAttribute("locale_identifier"))?,
    };

    // Defaults to alias-based negotiation at the root; a deliberate choice
    // rather than an inherited one, see DESIGN.md.
    let negotiate_aliases = partial
        .negotiate_aliases
        .or_else(|| fallback.map(AttributeSet::negotiate_aliases))
        .unwrap_or(true);

    let route_aliases = match partial.route_aliases {
        Some(raw) => normalize_route_aliases(raw),
        None => fallback
            .map(|f| f.route_aliases().clone())
            .unwrap_or_default(),
    };

    AttributeSet::new(
        supported_locales,
        default_locale,
        display,
        hide_default,
        route_aliases,
        locale_identifier,
        negotiate_aliases,
        partial.extra,
    )
}

fn normalize_supported(
    input: RawSupportedLocales,
    fallback: Option<&AttributeSet>,
) -> Result<BTreeMap<String, Locale>> {
    let mut out = BTreeMap::new();
    match input {
        RawSupportedLocales::Codes(codes) => {
            for code in codes {
                let locale = resolve_fallback_locale(&code, fallback)?;
                out.insert(locale.code().to_string(), locale);
            }
        }
        RawSupportedLocales::Map(map) => {
            for (key, spec) in map {
                let locale = match spec {
                    RawLocaleSpec::Code(code) => resolve_fallback_locale(&code, fallback)?,
                    RawLocaleSpec::Properties(raw) => raw.into_locale(&key),
                };
                out.insert(locale.code().to_string(), locale);
            }
        }
        RawSupportedLocales::Locales(locales) => {
            for locale in locales {
                out.insert(locale.code().to_string(), locale);
            }
        }
    }
    Ok(out)
}

/// A bare code string in `supported_locales` refers to a locale the fallback
/// set already defines.
fn resolve_fallback_locale(code: &str, fallback: Option<&AttributeSet>) -> Result<Locale> {
    fallback
        .and_then(|f| f.locale(code))
        .cloned()
        .ok_or_else(|| Error::UnsupportedGroupLocale(code.to_string()))
}

/// Parse raw route aliases into their functional form: both the route
/// reference and the alias value may be a bare path, a full URL, or (for
/// the alias) a domain-only URL meaning "domain override, path unchanged".
///
/// An alias path whose segment count differs from the canonical path is
/// dropped: it could never bind the same parameter shape. A domain override
/// on such an entry survives on its own.
fn normalize_route_aliases(raw: BTreeMap<String, BTreeMap<String, String>>) -> RouteAliasMap {
    let mut out = RouteAliasMap::new();

    for (code, routes) in raw {
        let mut per_locale = BTreeMap::new();

        for (route_ref, alias_ref) in routes {
            let (route_domain, route_path) = parse_route_ref(&route_ref);
            if route_path.is_empty() {
                warn!(locale = %code, route = %route_ref, "route alias for the root path ignored");
                continue;
            }

            let (alias_domain, alias_path) = parse_route_ref(&alias_ref);
            let alias_path = match alias_path {
                p if p.is_empty() => None,
                p if urlutil::segment_count(&p) != urlutil::segment_count(&route_path) => {
                    warn!(
                        locale = %code,
                        route = %route_ref,
                        alias = %alias_ref,
                        "route alias dropped: path segment count differs from the canonical path"
                    );
                    None
                }
                p => Some(p),
            };

            if alias_path.is_none() && alias_domain.is_none() {
                continue;
            }

            per_locale.insert(
                route_key(route_domain.as_deref(), &route_path),
                RouteAlias {
                    path: alias_path,
                    domain: alias_domain,
                },
            );
        }

        if !per_locale.is_empty() {
            out.insert(code, per_locale);
        }
    }

    out
}

/// Split a route reference into (domain, slash-trimmed decoded path).
fn parse_route_ref(reference: &str) -> (Option<String>, String) {
    let parts = urlutil::split_url(reference);
    let normalized_path = parts.normalized_path();
    (parts.host, normalized_path)
}
