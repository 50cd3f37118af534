//! Error taxonomy for locale configuration and lookup failures.
//!
//! All variants represent programmer or configuration errors: they are
//! surfaced to the caller rather than recovered from. Steady-state request
//! handling never produces them: URL rewriting signals "not localizable"
//! with `None`, and locale resolution always terminates at the default.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A `supported_locales` entry could not be resolved to a locale.
    #[error("the locale '{0}' is not supported (not configured in the supported_locales attribute)")]
    UnsupportedGroupLocale(String),

    /// The configured default locale is not a member of the supported set.
    #[error("specified default locale '{0}' is not supported")]
    UnsupportedDefaultLocale(String),

    /// An explicit attempt to activate a locale that is not supported.
    #[error("trying to set current locale to '{0}' which is not supported")]
    UnsupportedCurrentLocale(String),

    /// An attempt to overwrite a protected property after construction.
    #[error("the '{0}' property is immutable")]
    ImmutableProperty(String),

    /// The root attribute set must be complete; nothing to inherit from.
    #[error("the root attribute set is missing the required '{0}' attribute")]
    MissingAttribute(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
