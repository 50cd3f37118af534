//! URL localization for multi-locale web applications.
//!
//! Given a set of canonical routes, this crate generates per-locale route
//! variants, rewrites URLs between their canonical and localized forms, and
//! resolves which locale an inbound request belongs to.
//!
//! # Architecture
//!
//! - `locale` / `attributes`: the locale entity and the attribute set
//!   governing a route group (supported locales, default, display mode,
//!   route aliases).
//! - `normalizer`: merges partial attribute input with a fallback set into
//!   a complete, validated attribute set.
//! - `routing`: the route-table collaborator the core sits on, with route
//!   defaults and constraints, matching, rendering, and the match cache.
//! - `group`: localized route generation and the canonical ↔ localized
//!   mapping; URL localization and delocalization.
//! - `localizer`: the orchestrator owning groups, configuration and
//!   dispatch.
//! - `pipeline` / `redirect`: the two per-request hooks, in invocation
//!   order: locale resolution, then canonical-URL redirect normalization.
//!
//! # Example
//!
//! ```rust
//! use route_localizer::{Localizer, LocaleResolver, RawAttributes, RequestContext, Route};
//!
//! # fn main() -> Result<(), route_localizer::Error> {
//! let config = route_localizer::config::from_json_str(
//!     r#"{
//!         "supported_locales": {
//!             "en": {"name": "English", "native": "English", "script": "Latn"},
//!             "fr": {"name": "French", "native": "Français", "script": "Latn"}
//!         },
//!         "default_locale": "en",
//!         "display": 1,
//!         "hide_default": false,
//!         "locale_identifier": "locale"
//!     }"#,
//! )
//! .expect("valid configuration");
//!
//! let mut localizer = Localizer::new(config)?;
//! localizer.define_group(RawAttributes::new(), |routes| {
//!     routes.register(Route::get("about"));
//! })?;
//!
//! assert_eq!(
//!     localizer.localize("https://host/about", "fr").as_deref(),
//!     Some("https://host/fr/about")
//! );
//!
//! let mut ctx = RequestContext::get("https://host/fr/about");
//! let resolved = LocaleResolver::new().run(&localizer, &mut ctx);
//! assert_eq!(resolved.map(|l| l.code().to_string()).as_deref(), Some("fr"));
//! # Ok(())
//! # }
//! ```

pub mod attributes;
pub mod config;
pub mod error;
pub mod group;
pub mod locale;
pub mod localizer;
pub mod normalizer;
pub mod pipeline;
pub mod redirect;
pub mod request;
pub mod routing;
pub mod urlutil;

pub use attributes::{AttributeSet, DisplayMode, RouteAlias, RouteAliasMap};
pub use config::{RawAttributes, RawLocale};
pub use error::{Error, Result};
pub use group::Group;
pub use locale::{Direction, Locale};
pub use localizer::{GroupRegistrar, Localizer, RegionalFormatter};
pub use pipeline::{LocaleResolver, ProbeStep, ResolutionState, UserLocaleSource};
pub use redirect::{RedirectNormalizer, RedirectOutcome};
pub use request::{CookieStore, MemoryCookies, MemorySession, RequestContext, SessionStore};
pub use routing::{Constraint, MatchedRoute, Method, Route, RouteMatchCache, RouteTable};
