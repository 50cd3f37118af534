//! Integration tests for the URL localization core.
//!
//! These exercise the full flow: configuration → group definition with
//! localized route generation → URL rewriting → per-request locale
//! resolution → canonical-URL redirect normalization.

use anyhow::Result;
use proptest::prelude::*;

use route_localizer::{
    Constraint, DisplayMode, Error, LocaleResolver, Localizer, MemoryCookies, MemorySession,
    Method, RawAttributes, RedirectNormalizer, RedirectOutcome, RequestContext, Route,
    UserLocaleSource,
};

// ==================== Test Helpers ====================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Root configuration: en (default), ar, fr; segment display at position 1.
fn root_config() -> RawAttributes {
    route_localizer::config::from_json_str(
        r#"{
            "supported_locales": {
                "en": {"name": "English", "native": "English", "script": "Latn"},
                "ar": {"name": "Arabic", "native": "العربية", "script": "Arab"},
                "fr": {"name": "French", "native": "Français", "script": "Latn"}
            },
            "default_locale": "en",
            "display": 1,
            "hide_default": false,
            "locale_identifier": "locale"
        }"#,
    )
    .expect("valid configuration")
}

/// Localizer with one segment-mode group: `shop/items` (unnamed, with an
/// Arabic path alias) and `about` (unnamed, no aliases).
fn segment_localizer() -> Localizer {
    init_tracing();
    let mut localizer = Localizer::new(root_config()).expect("valid root configuration");
    localizer
        .define_group(
            RawAttributes::new().with_route_alias("ar", "shop/items", "تسوق/عناصر"),
            |routes| {
                routes.register(Route::get("shop/items"));
                routes.register(Route::get("about"));
            },
        )
        .expect("valid group");
    localizer
}

/// Localizer with one query-mode group over `about`.
fn query_localizer() -> Localizer {
    init_tracing();
    let mut localizer = Localizer::new(root_config()).expect("valid root configuration");
    localizer
        .define_group(RawAttributes::new().with_display_query("lang"), |routes| {
            routes.register(Route::get("about"));
        })
        .expect("valid group");
    localizer
}

/// Localizer with one hidden-mode group: `shop/items` with an Arabic alias.
fn hidden_localizer() -> Localizer {
    init_tracing();
    let mut localizer = Localizer::new(root_config()).expect("valid root configuration");
    localizer
        .define_group(
            RawAttributes::new()
                .with_display_hidden()
                .with_route_alias("ar", "shop/items", "تسوق/عناصر"),
            |routes| {
                routes.register(Route::get("shop/items"));
            },
        )
        .expect("valid group");
    localizer
}

// ==================== Segment Mode Localization Tests ====================

#[test]
fn test_segment_localize_with_route_alias() {
    let localizer = segment_localizer();
    assert_eq!(
        localizer.localize("https://host/shop/items?x=1", "ar").as_deref(),
        Some("https://host/ar/تسوق/عناصر?x=1")
    );
}

#[test]
fn test_segment_localize_placeholder_locale() {
    let localizer = segment_localizer();
    assert_eq!(
        localizer.localize("https://host/shop/items?x=1", "fr").as_deref(),
        Some("https://host/fr/shop/items?x=1")
    );
}

#[test]
fn test_segment_localize_already_localized_url() {
    let localizer = segment_localizer();
    // Rewriting a French URL to Arabic goes through the canonical form.
    assert_eq!(
        localizer.localize("https://host/fr/shop/items", "ar").as_deref(),
        Some("https://host/ar/تسوق/عناصر")
    );
}

#[test]
fn test_segment_delocalize_alias_and_placeholder_urls() {
    let localizer = segment_localizer();
    assert_eq!(
        localizer.delocalize("https://host/ar/تسوق/عناصر?x=1").as_deref(),
        Some("https://host/shop/items?x=1")
    );
    assert_eq!(
        localizer.delocalize("https://host/fr/shop/items").as_deref(),
        Some("https://host/shop/items")
    );
}

#[test]
fn test_segment_localize_decodes_percent_encoded_input() {
    let localizer = segment_localizer();
    assert_eq!(
        localizer
            .delocalize("https://host/ar/%D8%AA%D8%B3%D9%88%D9%82/%D8%B9%D9%86%D8%A7%D8%B5%D8%B1")
            .as_deref(),
        Some("https://host/shop/items")
    );
}

#[test]
fn test_localize_unknown_url_returns_none() {
    let localizer = segment_localizer();
    assert_eq!(localizer.localize("https://host/missing", "fr"), None);
    assert_eq!(localizer.delocalize("https://host/missing"), None);
}

#[test]
fn test_localize_unsupported_locale_returns_none() {
    let localizer = segment_localizer();
    assert_eq!(localizer.localize("https://host/shop/items", "de"), None);
}

#[test]
fn test_localize_relative_url() {
    let localizer = segment_localizer();
    assert_eq!(
        localizer.localize("/about?x=1", "fr").as_deref(),
        Some("/fr/about?x=1")
    );
}

// ==================== Placeholder Exclusivity Tests ====================

#[test]
fn test_placeholder_and_concrete_routes_are_mutually_exclusive() {
    let localizer = segment_localizer();
    let group = &localizer.groups()[0];

    let arabic = group.localized_route("shop/items", "ar").expect("ar route");
    let french = group.localized_route("shop/items", "fr").expect("fr route");
    let english = group.localized_route("shop/items", "en").expect("en route");

    // ar gets its own concrete route; en and fr share the placeholder.
    assert_eq!(arabic.key(), "ar/تسوق/عناصر");
    assert_eq!(french.key(), english.key());
    assert_eq!(french.key(), "{locale}/shop/items");
    assert_ne!(arabic.key(), french.key());
}

#[test]
fn test_placeholder_constraint_excludes_aliased_locale() {
    let localizer = segment_localizer();
    // The placeholder serves en and fr only; "ar" must not match it.
    assert!(localizer.table().match_url(Method::Get, "/ar/shop/items").is_none());
    assert!(localizer.table().match_url(Method::Get, "/fr/shop/items").is_some());
}

#[test]
fn test_named_route_gets_concrete_route_per_locale() -> Result<()> {
    let mut localizer = Localizer::new(root_config())?;
    localizer.define_group(RawAttributes::new(), |routes| {
        routes.register(Route::get("contact").with_name("contact"));
    })?;

    for code in ["en", "ar", "fr"] {
        let name = format!("contact.{code}");
        assert!(
            localizer.table().by_name(&name).is_some(),
            "missing localized route {name}"
        );
    }
    assert_eq!(
        localizer.localize("https://host/contact", "ar").as_deref(),
        Some("https://host/ar/contact")
    );
    Ok(())
}

// ==================== Query Mode Tests ====================

#[test]
fn test_query_localize_sets_display_key() {
    let localizer = query_localizer();
    assert_eq!(
        localizer.localize("https://host/about", "fr").as_deref(),
        Some("https://host/about?lang=fr")
    );
}

#[test]
fn test_query_delocalize_drops_display_key() {
    let localizer = query_localizer();
    assert_eq!(
        localizer.delocalize("https://host/about?lang=fr").as_deref(),
        Some("https://host/about")
    );
}

#[test]
fn test_query_mode_generates_no_extra_routes() {
    let localizer = query_localizer();
    assert_eq!(localizer.table().len(), 1);
}

// ==================== Hidden Mode Tests ====================

#[test]
fn test_hidden_localize_alias_locale_changes_path() {
    let localizer = hidden_localizer();
    assert_eq!(
        localizer.localize("https://host/shop/items", "ar").as_deref(),
        Some("https://host/تسوق/عناصر")
    );
}

#[test]
fn test_hidden_localize_plain_locale_keeps_canonical_path() {
    let localizer = hidden_localizer();
    assert_eq!(
        localizer.localize("https://host/shop/items", "fr").as_deref(),
        Some("https://host/shop/items")
    );
}

#[test]
fn test_hidden_delocalize_alias_url() {
    let localizer = hidden_localizer();
    assert_eq!(
        localizer.delocalize("https://host/تسوق/عناصر").as_deref(),
        Some("https://host/shop/items")
    );
}

// ==================== Hide Default Tests ====================

#[test]
fn test_hide_default_localizing_default_equals_delocalizing() -> Result<()> {
    for display in ["segment", "query", "hidden"] {
        let mut localizer = Localizer::new(root_config())?;
        let attrs = match display {
            "segment" => RawAttributes::new().with_hide_default(true),
            "query" => RawAttributes::new().with_hide_default(true).with_display_query("lang"),
            _ => RawAttributes::new().with_hide_default(true).with_display_hidden(),
        };
        localizer.define_group(attrs, |routes| {
            routes.register(Route::get("about"));
        })?;

        let localized = localizer.localize("https://host/about?x=1", "en");
        let delocalized = localizer.delocalize("https://host/about?x=1");
        assert_eq!(localized, delocalized, "display mode {display}");
    }
    Ok(())
}

// ==================== Round-Trip Tests ====================

#[test]
fn test_delocalize_after_localize_reaches_canonical_form() {
    let localizer = segment_localizer();
    for url in ["https://host/shop/items?x=1", "https://host/about", "/about"] {
        let canonical = localizer.delocalize(url);
        for code in ["en", "ar", "fr"] {
            let localized = localizer.localize(url, code).expect("localizable");
            assert_eq!(
                localizer.delocalize(&localized),
                canonical,
                "round trip failed for {url} via {code}"
            );
        }
    }
}

proptest! {
    #[test]
    fn prop_round_trip_up_to_canonical_form(
        url_index in 0usize..4,
        locale_index in 0usize..3,
    ) {
        let localizer = segment_localizer();
        let urls = [
            "https://host/shop/items",
            "https://host/shop/items?x=1&y=2",
            "https://host/about",
            "https://host/fr/shop/items",
        ];
        let locales = ["en", "ar", "fr"];

        let url = urls[url_index];
        let code = locales[locale_index];

        let localized = localizer.localize(url, code).expect("localizable");
        prop_assert_eq!(localizer.delocalize(&localized), localizer.delocalize(url));
    }
}

// ==================== Membership Tests ====================

#[test]
fn test_is_localized_url_and_route_name() -> Result<()> {
    let mut localizer = Localizer::new(root_config())?;
    localizer.define_group(RawAttributes::new(), |routes| {
        routes.register(Route::get("contact").with_name("contact"));
        routes.register_ignored(Route::get("health"));
    })?;

    assert!(localizer.is_localized_url("https://host/contact", Method::Get));
    assert!(localizer.is_localized_url("https://host/fr/contact", Method::Get));
    assert!(!localizer.is_localized_url("https://host/health", Method::Get));
    assert!(!localizer.is_localized_url("https://host/missing", Method::Get));

    assert!(localizer.is_localized_route_name("contact"));
    assert!(localizer.is_localized_route_name("contact.fr"));
    assert!(!localizer.is_localized_route_name("missing"));
    Ok(())
}

#[test]
fn test_ignored_block_excludes_routes() -> Result<()> {
    let mut localizer = Localizer::new(root_config())?;
    localizer.define_group(RawAttributes::new(), |routes| {
        routes.register(Route::get("contact"));
        routes.ignoring(|routes| {
            routes.register(Route::get("admin/panel"));
        });
    })?;

    assert!(localizer.is_localized_url("https://host/contact", Method::Get));
    assert!(!localizer.is_localized_url("https://host/admin/panel", Method::Get));
    // Ignored routes stay registered and keep matching.
    assert!(localizer.table().match_url(Method::Get, "/admin/panel").is_some());
    Ok(())
}

// ==================== Route Derivation Tests ====================

#[test]
fn test_generated_routes_copy_defaults_and_constraints() -> Result<()> {
    let mut localizer = Localizer::new(root_config())?;
    localizer.define_group(RawAttributes::new(), |routes| {
        routes.register(
            Route::get("items/{id}")
                .with_name("items.show")
                .with_action("items#show")
                .with_default("page", "1")
                .with_constraint("id", Constraint::pattern(r"\d+").expect("valid pattern")),
        );
    })?;

    let localized = localizer.table().by_name("items.show.fr").expect("fr route");
    assert_eq!(localized.action(), "items#show");
    assert_eq!(localized.defaults().get("page").map(String::as_str), Some("1"));
    assert!(localized.constraints().contains_key("id"));

    // The copied constraint still applies when matching.
    assert!(localizer.table().match_url(Method::Get, "/fr/items/42").is_some());
    assert!(localizer.table().match_url(Method::Get, "/fr/items/abc").is_none());

    assert_eq!(
        localizer.localize("https://host/items/42", "fr").as_deref(),
        Some("https://host/fr/items/42")
    );
    Ok(())
}

#[test]
fn test_domain_alias_generates_domain_bound_route() -> Result<()> {
    let mut localizer = Localizer::new(root_config())?;
    localizer.define_group(
        RawAttributes::new()
            .with_display_hidden()
            .with_route_alias("ar", "shop/items", "https://ar.example.com"),
        |routes| {
            routes.register(Route::get("shop/items"));
        },
    )?;

    assert_eq!(
        localizer.localize("https://example.com/shop/items", "ar").as_deref(),
        Some("https://ar.example.com/shop/items")
    );
    Ok(())
}

// ==================== Resolution Pipeline Tests ====================

#[test]
fn test_pipeline_resolves_from_url_segment() {
    let localizer = segment_localizer();
    let session = MemorySession::new();
    let cookies = MemoryCookies::new();
    let mut ctx = RequestContext::get("https://host/fr/shop/items")
        .with_session(session.clone())
        .with_cookies(cookies.clone());

    let resolved = LocaleResolver::new().run(&localizer, &mut ctx).expect("resolved");
    assert_eq!(resolved.code(), "fr");
    assert_eq!(ctx.locale(), Some("fr"));
    assert_eq!(ctx.fallback_locale(), Some("en"));

    // Commit persists into both stores.
    assert_eq!(session.value("locale"), Some("fr".to_string()));
    assert_eq!(cookies.value("locale"), Some("fr".to_string()));
}

#[test]
fn test_pipeline_resolves_from_session_before_cookie() {
    let localizer = segment_localizer();
    let session = MemorySession::new();
    session.insert("locale", "ar");
    let cookies = MemoryCookies::new();
    cookies.insert("locale", "fr");

    let mut ctx = RequestContext::get("https://host/shop/items")
        .with_session(session)
        .with_cookies(cookies);

    let resolved = LocaleResolver::new().run(&localizer, &mut ctx).expect("resolved");
    assert_eq!(resolved.code(), "ar");
}

#[test]
fn test_pipeline_resolves_from_cookie() {
    let localizer = segment_localizer();
    let cookies = MemoryCookies::new();
    cookies.insert("locale", "fr");

    let mut ctx = RequestContext::get("https://host/shop/items").with_cookies(cookies);
    let resolved = LocaleResolver::new().run(&localizer, &mut ctx).expect("resolved");
    assert_eq!(resolved.code(), "fr");
}

#[test]
fn test_pipeline_resolves_from_body_on_non_get_hidden_mode() -> Result<()> {
    let mut localizer = Localizer::new(root_config())?;
    localizer.define_group(RawAttributes::new().with_display_hidden(), |routes| {
        routes.register(Route::get("shop/items"));
        routes.register(Route::new([Method::Post], "cart"));
    })?;

    let mut ctx =
        RequestContext::new(Method::Post, "https://host/cart").with_body_field("locale", "ar");
    let resolved = LocaleResolver::new().run(&localizer, &mut ctx).expect("resolved");
    assert_eq!(resolved.code(), "ar");
    Ok(())
}

#[test]
fn test_pipeline_ignores_body_field_in_segment_mode() -> Result<()> {
    let mut localizer = Localizer::new(root_config())?;
    localizer.define_group(RawAttributes::new(), |routes| {
        routes.register(Route::new([Method::Post], "cart"));
    })?;

    // Segment mode never reads the body; with no other signal the default
    // wins.
    let mut ctx =
        RequestContext::new(Method::Post, "https://host/cart").with_body_field("locale", "ar");
    let resolved = LocaleResolver::new().run(&localizer, &mut ctx).expect("resolved");
    assert_eq!(resolved.code(), "en");
    Ok(())
}

#[test]
fn test_pipeline_resolves_from_negotiation() {
    let localizer = segment_localizer();
    let mut ctx =
        RequestContext::get("https://host/shop/items").with_accept_language("de,fr;q=0.7");
    let resolved = LocaleResolver::new().run(&localizer, &mut ctx).expect("resolved");
    assert_eq!(resolved.code(), "fr");
}

#[test]
fn test_pipeline_falls_back_to_default_without_signals() {
    let localizer = segment_localizer();
    let mut ctx =
        RequestContext::get("https://host/shop/items").with_accept_language("de,pl;q=0.5");
    let resolved = LocaleResolver::new().run(&localizer, &mut ctx).expect("resolved");
    assert_eq!(resolved.code(), "en");
}

#[test]
fn test_pipeline_rejects_tampered_signal_and_falls_back() {
    let localizer = segment_localizer();
    let cookies = MemoryCookies::new();
    cookies.insert("locale", "xx");

    let mut ctx = RequestContext::get("https://host/shop/items").with_cookies(cookies);
    let resolved = LocaleResolver::new().run(&localizer, &mut ctx).expect("resolved");
    assert_eq!(resolved.code(), "en");
}

#[test]
fn test_pipeline_is_idempotent() {
    let localizer = segment_localizer();
    let session = MemorySession::new();
    let mut ctx =
        RequestContext::get("https://host/fr/shop/items").with_session(session.clone());

    let resolver = LocaleResolver::new();
    let first = resolver.run(&localizer, &mut ctx).expect("resolved");

    // Tamper with the session; a second run must not re-resolve.
    session.insert("locale", "ar");
    let second = resolver.run(&localizer, &mut ctx).expect("still resolved");

    assert_eq!(first.code(), "fr");
    assert_eq!(second.code(), "fr");
    assert_eq!(ctx.locale(), Some("fr"));
}

#[test]
fn test_pipeline_skips_non_localized_routes() -> Result<()> {
    let mut localizer = Localizer::new(root_config())?;
    localizer.define_group(RawAttributes::new(), |routes| {
        routes.register(Route::get("contact"));
        routes.register_ignored(Route::get("health"));
    })?;

    let mut ctx = RequestContext::get("https://host/health");
    assert!(LocaleResolver::new().run(&localizer, &mut ctx).is_none());
    assert_eq!(ctx.locale(), None);
    Ok(())
}

#[derive(Debug)]
struct FixedUserLocale(&'static str);

impl UserLocaleSource for FixedUserLocale {
    fn user_locale(&self, _ctx: &RequestContext) -> Option<String> {
        Some(self.0.to_string())
    }
}

#[test]
fn test_pipeline_user_source_extension_point() {
    let localizer = segment_localizer();
    let mut ctx = RequestContext::get("https://host/shop/items");
    let resolver = LocaleResolver::new().with_user_source(FixedUserLocale("ar"));
    let resolved = resolver.run(&localizer, &mut ctx).expect("resolved");
    assert_eq!(resolved.code(), "ar");
}

#[test]
fn test_pipeline_reverse_maps_alias_candidates() -> Result<()> {
    init_tracing();
    let config = route_localizer::config::from_json_str(
        r#"{
            "supported_locales": {
                "en": {"name": "English", "native": "English", "script": "Latn"},
                "ar": {"name": "Arabic", "native": "العربية", "script": "Arab", "alias": "عربي"}
            },
            "default_locale": "en",
            "display": 1,
            "hide_default": false,
            "locale_identifier": "locale"
        }"#,
    )
    .expect("valid configuration");

    let mut localizer = Localizer::new(config)?;
    localizer.define_group(RawAttributes::new(), |routes| {
        routes.register(Route::get("shop"));
    })?;

    // The URL carries the display alias; resolution lands on the code.
    let mut ctx = RequestContext::get("https://host/عربي/shop");
    let resolved = LocaleResolver::new().run(&localizer, &mut ctx).expect("resolved");
    assert_eq!(resolved.code(), "ar");
    Ok(())
}

#[test]
fn test_pipeline_negotiation_on_codes_when_configured() -> Result<()> {
    let config = route_localizer::config::from_json_str(
        r#"{
            "supported_locales": {
                "en": {"name": "English", "native": "English", "script": "Latn"},
                "ar": {"name": "Arabic", "native": "العربية", "script": "Arab", "alias": "عربي"}
            },
            "default_locale": "en",
            "display": 1,
            "hide_default": false,
            "locale_identifier": "locale",
            "negotiate_aliases": false
        }"#,
    )
    .expect("valid configuration");

    let mut localizer = Localizer::new(config)?;
    localizer.define_group(RawAttributes::new(), |routes| {
        routes.register(Route::get("shop"));
    })?;

    let mut ctx = RequestContext::get("https://host/shop").with_accept_language("ar");
    let resolved = LocaleResolver::new().run(&localizer, &mut ctx).expect("resolved");
    assert_eq!(resolved.code(), "ar");
    Ok(())
}

// ==================== Current Locale Tests ====================

#[test]
fn test_set_current_locale_unsupported_code_fails() {
    let localizer = segment_localizer();
    let mut ctx = RequestContext::get("https://host/shop/items");
    let err = localizer.set_current_locale(&mut ctx, "xx").unwrap_err();
    assert_eq!(err, Error::UnsupportedCurrentLocale("xx".to_string()));
    assert_eq!(ctx.locale(), None);
}

#[derive(Debug, Clone, Default)]
struct RecordingFormatter {
    applied: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

impl route_localizer::RegionalFormatter for RecordingFormatter {
    fn apply(&self, locale: &route_localizer::Locale) {
        self.applied
            .lock()
            .expect("formatter lock")
            .push(locale.regional().join(","));
    }
}

#[test]
fn test_regional_formatter_receives_resolved_locale() -> Result<()> {
    let formatter = RecordingFormatter::default();
    let mut localizer =
        Localizer::new(root_config())?.with_regional_formatter(formatter.clone());
    localizer.define_group(RawAttributes::new(), |routes| {
        routes.register(Route::get("shop/items"));
    })?;

    let mut ctx = RequestContext::get("https://host/ar/shop/items");
    LocaleResolver::new().run(&localizer, &mut ctx).expect("resolved");

    let applied = formatter.applied.lock().expect("formatter lock");
    assert_eq!(applied.len(), 1);
    assert!(applied[0].contains("ar.utf8"));
    assert!(applied[0].contains("POSIX"));
    Ok(())
}

#[test]
fn test_set_current_locale_persists_and_reports() {
    let localizer = segment_localizer();
    let session = MemorySession::new();
    let mut ctx = RequestContext::get("https://host/shop/items").with_session(session.clone());

    let locale = localizer.set_current_locale(&mut ctx, "ar").expect("supported");
    assert_eq!(locale.code(), "ar");
    assert!(localizer.is_current_locale(&ctx, "ar"));
    assert_eq!(localizer.current_locale(&ctx).map(|l| l.code()), Some("ar"));
    assert_eq!(session.value("locale"), Some("ar".to_string()));
}

// ==================== Redirect Normalizer Tests ====================

#[test]
fn test_redirect_to_canonical_localized_url() {
    let localizer = segment_localizer();
    let session = MemorySession::new();
    let mut ctx = RequestContext::get("https://host/shop/items?x=1").with_session(session.clone());

    localizer.set_current_locale(&mut ctx, "fr").expect("supported");
    let outcome = RedirectNormalizer::new().run(&localizer, &mut ctx);

    assert_eq!(
        outcome,
        RedirectOutcome::Redirect("https://host/fr/shop/items?x=1".to_string())
    );
    assert!(session.was_reflashed());
}

#[test]
fn test_redirect_proceeds_on_canonical_url_and_strips_locale_param() {
    let localizer = segment_localizer();
    let mut ctx = RequestContext::get("https://host/fr/shop/items");

    localizer.set_current_locale(&mut ctx, "fr").expect("supported");
    let outcome = RedirectNormalizer::new().run(&localizer, &mut ctx);

    assert_eq!(outcome, RedirectOutcome::Proceed);
    // The locale segment matched as a bound parameter; it must not leak.
    assert_eq!(ctx.route_param("locale"), None);
    assert!(ctx.route_params().is_some());
}

#[test]
fn test_redirect_ignores_query_and_trailing_slash_differences() {
    let localizer = segment_localizer();
    let mut ctx = RequestContext::get("https://host/fr/shop/items/?y=2");

    localizer.set_current_locale(&mut ctx, "fr").expect("supported");
    assert_eq!(
        RedirectNormalizer::new().run(&localizer, &mut ctx),
        RedirectOutcome::Proceed
    );
}

#[test]
fn test_redirect_skipped_in_query_mode() {
    let localizer = query_localizer();
    let mut ctx = RequestContext::get("https://host/about");

    localizer.set_current_locale(&mut ctx, "fr").expect("supported");
    assert_eq!(
        RedirectNormalizer::new().run(&localizer, &mut ctx),
        RedirectOutcome::Proceed
    );
}

#[test]
fn test_redirect_skipped_without_resolved_locale() {
    let localizer = segment_localizer();
    let mut ctx = RequestContext::get("https://host/shop/items");
    assert_eq!(
        RedirectNormalizer::new().run(&localizer, &mut ctx),
        RedirectOutcome::Proceed
    );
}

#[test]
fn test_full_request_flow_resolve_then_redirect() {
    let localizer = segment_localizer();
    let cookies = MemoryCookies::new();
    cookies.insert("locale", "ar");

    // Hooks run in order: resolution first, then redirect normalization.
    let mut ctx = RequestContext::get("https://host/shop/items").with_cookies(cookies);
    let resolved = LocaleResolver::new().run(&localizer, &mut ctx).expect("resolved");
    assert_eq!(resolved.code(), "ar");

    let outcome = RedirectNormalizer::new().run(&localizer, &mut ctx);
    assert_eq!(
        outcome,
        RedirectOutcome::Redirect("https://host/ar/تسوق/عناصر".to_string())
    );
}

#[test]
fn test_localize_current_uses_resolved_locale() {
    let localizer = segment_localizer();
    let mut ctx = RequestContext::get("https://host/ar/تسوق/عناصر");
    LocaleResolver::new().run(&localizer, &mut ctx).expect("resolved");

    assert_eq!(
        localizer.localize_current(&ctx, "https://host/about").as_deref(),
        Some("https://host/ar/about")
    );
    assert_eq!(
        localizer.localized_page_path("shop.checkout", "ar"),
        "ar/shop/checkout"
    );
}

// ==================== Configuration Mutation Tests ====================

#[test]
fn test_set_config_default_locale_validates_membership() -> Result<()> {
    let mut localizer = Localizer::new(root_config())?;
    localizer.set_config_default_locale("fr")?;
    assert_eq!(localizer.default_locale().code(), "fr");

    let err = localizer.set_config_default_locale("xx").unwrap_err();
    assert_eq!(err, Error::UnsupportedDefaultLocale("xx".to_string()));
    Ok(())
}

#[test]
fn test_add_config_locales_extends_supported_set() -> Result<()> {
    let mut localizer = Localizer::new(root_config())?;
    localizer.add_config_locales(vec![route_localizer::Locale::new(
        "de", "German", "Deutsch", "Latn",
    )])?;

    assert!(localizer.is_supported_locale("de"));
    assert_eq!(localizer.supported_locales().len(), 4);
    // The default is untouched by additions.
    assert_eq!(localizer.default_locale().code(), "en");
    Ok(())
}

// ==================== Group Attribute Inheritance Tests ====================

#[test]
fn test_group_narrows_locales_and_keeps_display() -> Result<()> {
    let mut localizer = Localizer::new(root_config())?;
    let group_attrs = {
        let group = localizer.define_group(
            RawAttributes::new()
                .with_locale_codes(["en", "fr"])
                .with_default_locale("fr"),
            |routes| {
                routes.register(Route::get("about"));
            },
        )?;
        group.attributes().clone()
    };

    assert_eq!(group_attrs.supported_locales().len(), 2);
    assert_eq!(group_attrs.default_locale().code(), "fr");
    assert_eq!(group_attrs.display(), &DisplayMode::Segment(1));

    // Unsupported locale for this group even though the config knows it.
    assert_eq!(localizer.localize("https://host/about", "ar"), None);
    Ok(())
}

// ==================== Cache Behavior Tests ====================

#[test]
fn test_route_match_cache_memoizes_lookups() {
    let localizer = segment_localizer();

    localizer.localize("https://host/shop/items", "fr");
    let entries_after_first = localizer.cache().entries();

    localizer.localize("https://host/shop/items", "ar");
    localizer.localize("https://host/shop/items", "fr");

    assert_eq!(localizer.cache().entries(), entries_after_first);
}
