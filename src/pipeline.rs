//! Per-request locale resolution: a small state machine that probes an
//! ordered list of sources and always terminates on the default locale.
//!
//! The pipeline runs at most once per request (the resolved locale on the
//! context acts as the idempotence guard) and only when the request's route
//! is localized. Every candidate passes through the alias reverse map and a
//! supported-set check before it can win; a rejected candidate advances the
//! machine to the next probe.

use std::fmt;

use tracing::debug;

use crate::attributes::{AttributeSet, DisplayMode};
use crate::locale::Locale;
use crate::localizer::Localizer;
use crate::request::RequestContext;
use crate::routing::Method;

/// Resolution progress for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    Unresolved,
    Probing(ProbeStep),
    Resolved(String),
}

/// The ordered probe sequence. `DefaultFallback` always yields a supported
/// code, which is what makes the machine total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStep {
    /// Locale field in a non-GET request body (hidden display only).
    BodyInput,
    /// Locale embedded in a GET URL: path segment or query key.
    UrlEmbedded,
    /// Session value under the locale identifier.
    Session,
    /// Cookie value under the locale identifier.
    Cookie,
    /// Pluggable user-preference source.
    UserSource,
    /// Content negotiation against the client's preferred languages.
    Negotiation,
    /// Terminal: the group default.
    DefaultFallback,
}

impl ProbeStep {
    pub const FIRST: ProbeStep = ProbeStep::BodyInput;

    pub fn next(self) -> Option<ProbeStep> {
        match self {
            ProbeStep::BodyInput => Some(ProbeStep::UrlEmbedded),
            ProbeStep::UrlEmbedded => Some(ProbeStep::Session),
            ProbeStep::Session => Some(ProbeStep::Cookie),
            ProbeStep::Cookie => Some(ProbeStep::UserSource),
            ProbeStep::UserSource => Some(ProbeStep::Negotiation),
            ProbeStep::Negotiation => Some(ProbeStep::DefaultFallback),
            ProbeStep::DefaultFallback => None,
        }
    }
}

/// Extension point for a persisted user preference (e.g. a profile field).
/// The default resolver has none.
pub trait UserLocaleSource: fmt::Debug {
    fn user_locale(&self, ctx: &RequestContext) -> Option<String>;
}

/// The resolution pipeline. Stateless across requests; per-request state
/// lives on the context.
#[derive(Debug, Default)]
pub struct LocaleResolver {
    user_source: Option<Box<dyn UserLocaleSource>>,
}

impl LocaleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_source(mut self, source: impl UserLocaleSource + 'static) -> Self {
        self.user_source = Some(Box::new(source));
        self
    }

    /// Resolve and activate the request locale. Returns the active locale,
    /// or `None` when the request's route is not localized. A second call
    /// on the same request is a no-op returning the already-resolved locale.
    pub fn run(&self, localizer: &Localizer, ctx: &mut RequestContext) -> Option<Locale> {
        if ctx.locale().is_some() {
            return localizer.current_locale(ctx).cloned();
        }

        let matched = localizer.match_request(ctx)?;
        if !localizer.is_localized_route(&matched.route) {
            return None;
        }

        let attrs = localizer.request_attributes(ctx);
        let mut state = ResolutionState::Unresolved;

        let code = loop {
            state = match state {
                ResolutionState::Unresolved => ResolutionState::Probing(ProbeStep::FIRST),
                ResolutionState::Probing(step) => match self.candidate(step, ctx, attrs) {
                    Some(code) => {
                        debug!(?step, locale = %code, "locale resolved");
                        ResolutionState::Resolved(code)
                    }
                    None => match step.next() {
                        Some(next) => ResolutionState::Probing(next),
                        // DefaultFallback yields unconditionally; this arm
                        // only keeps the machine total.
                        None => {
                            ResolutionState::Resolved(attrs.default_locale().code().to_string())
                        }
                    },
                },
                ResolutionState::Resolved(code) => break code,
            };
        };

        let locale = localizer
            .set_current_locale(ctx, &code)
            .expect("resolved candidates are validated against the same attribute set");
        Some(locale)
    }

    /// Probe one step and validate the raw candidate: reverse-map a display
    /// alias to its code, then require membership in the supported set.
    fn candidate(
        &self,
        step: ProbeStep,
        ctx: &RequestContext,
        attrs: &AttributeSet,
    ) -> Option<String> {
        let raw = self.probe(step, ctx, attrs)?;
        let code = attrs
            .code_for_alias(&raw)
            .unwrap_or(raw.as_str())
            .to_string();

        if attrs.is_supported(&code) {
            Some(code)
        } else {
            debug!(?step, candidate = %raw, "locale candidate rejected");
            None
        }
    }

    fn probe(&self, step: ProbeStep, ctx: &RequestContext, attrs: &AttributeSet) -> Option<String> {
        match step {
            ProbeStep::BodyInput => {
                if ctx.method() == Method::Get || attrs.display() != &DisplayMode::Hidden {
                    return None;
                }
                ctx.body_value(attrs.locale_identifier()).map(str::to_string)
            }
            ProbeStep::UrlEmbedded => {
                if ctx.method() != Method::Get {
                    return None;
                }
                match attrs.display() {
                    DisplayMode::Segment(index) => {
                        let segments = ctx.segments();
                        if segments.is_empty() {
                            return None;
                        }
                        let position = (*index).clamp(1, segments.len());
                        segments.get(position - 1).cloned()
                    }
                    DisplayMode::Query(key) => ctx.query_value(key).map(str::to_string),
                    DisplayMode::Hidden => None,
                }
            }
            ProbeStep::Session => ctx.session().get(attrs.locale_identifier()),
            ProbeStep::Cookie => ctx.cookies().get(attrs.locale_identifier()),
            ProbeStep::UserSource => self
                .user_source
                .as_ref()
                .and_then(|source| source.user_locale(ctx)),
            ProbeStep::Negotiation => {
                let available: Vec<String> = if attrs.negotiate_aliases() {
                    attrs.locale_aliases().values().cloned().collect()
                } else {
                    attrs.supported_locales().keys().cloned().collect()
                };
                ctx.preferred_language(&available)
            }
            ProbeStep::DefaultFallback => Some(attrs.default_locale().code().to_string()),
        }
    }
}
