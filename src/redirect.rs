//! Canonical-URL redirect normalization.
//!
//! For GET requests with a resolved locale (and a display mode that puts
//! the locale in the path, or nowhere), the requested URL must be the
//! canonical localized form. Anything else (a bare canonical URL in
//! segment mode, a stale alias) redirects, after re-flashing transient
//! session state so flash data survives the extra hop.

use tracing::debug;

use crate::attributes::DisplayMode;
use crate::localizer::Localizer;
use crate::request::RequestContext;
use crate::routing::Method;
use crate::urlutil;

/// What the host should do with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// The URL is already canonical; continue the pipeline.
    Proceed,
    /// Stop and redirect to the canonical localized URL.
    Redirect(String),
}

#[derive(Debug, Default)]
pub struct RedirectNormalizer;

impl RedirectNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the check for one request. Query display mode never redirects;
    /// the query key is informational, not canonical.
    pub fn run(&self, localizer: &Localizer, ctx: &mut RequestContext) -> RedirectOutcome {
        if ctx.method() != Method::Get {
            return RedirectOutcome::Proceed;
        }
        let Some(code) = ctx.locale().map(str::to_string) else {
            return RedirectOutcome::Proceed;
        };

        let attrs = localizer.request_attributes(ctx);
        if matches!(attrs.display(), DisplayMode::Query(_)) {
            return RedirectOutcome::Proceed;
        }
        let is_segment = matches!(attrs.display(), DisplayMode::Segment(_));
        let identifier = attrs.locale_identifier().to_string();

        let Some(localized) = localizer.localize(ctx.url(), &code) else {
            return RedirectOutcome::Proceed;
        };

        // Query string and trailing slash are ignored in the comparison.
        let requested = urlutil::normalize_path(&urlutil::split_url(ctx.url()).path);
        let canonical = urlutil::normalize_path(&urlutil::split_url(&localized).path);

        if requested != canonical {
            ctx.session_mut().reflash();
            debug!(from = %ctx.url(), to = %localized, "redirecting to canonical localized URL");
            return RedirectOutcome::Redirect(localized);
        }

        if is_segment {
            // The locale segment matched as a route parameter; keep it out
            // of downstream parameter binding.
            localizer.bind_route_params(ctx);
            ctx.forget_route_param(&identifier);
        }

        RedirectOutcome::Proceed
    }
}
