//! Assembly of the client-side consent engine (the banner JS artifact).
//!
//! The IIFE itself lives in `templates/runtime.js`; this module fills its slots
//! with the JSON settings object, the four category loader bodies and either the
//! GA4 block or no-op stubs.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::config::{BannerConfig, FooterIcons, InlineLinkType, TrackingCategory};
use crate::generator::i18n::{Locale, translation_tables};
use crate::generator::scripts::{LoadPlan, LoaderOptions, render_loaders};
use crate::utils::template::{Fragment, Template};

const RUNTIME_TEMPLATE: &str = include_str!("templates/runtime.js");
const GA_TEMPLATE: &str = include_str!("templates/ga.js");
const GA_STUB_TEMPLATE: &str = include_str!("templates/ga_stub.js");
const CONSENT_INIT: &str = include_str!("templates/consent-init.js");

/// Name of the cookie holding the visitor's decision.
pub const CONSENT_COOKIE: &str = "cookie_consent";

/// Stylesheet serving the Material Symbols glyphs used by the settings icons.
pub const ICON_FONT_URL: &str = "https://fonts.googleapis.com/css2?family=Material+Symbols+Outlined:opsz,wght,FILL,GRAD@20..48,100..700,0..1,-50..200";

/// Slot filled by each category's loader body.
fn loader_slot(category: TrackingCategory) -> &'static str {
    match category {
        TrackingCategory::StrictlyNecessary => "strictly_necessary",
        TrackingCategory::Functionality => "functionality",
        TrackingCategory::TrackingPerformance => "analytics",
        TrackingCategory::TargetingAdvertising => "marketing",
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GaSettings {
    pub measurement_id: String,
    pub track_consent_events: bool,
    pub track_impressions: bool,
    pub anonymize_ip: bool,
}

/// Configuration embedded into the runtime as `SETTINGS`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSettings {
    pub cookie_name: &'static str,
    pub cookie_expiry: u32,
    pub auto_show: bool,
    pub dismiss_on_scroll: bool,
    pub show_preferences: bool,
    pub language: &'static str,
    pub google_consent_mode: bool,
    pub floating_button: bool,
    pub icons: FooterIcons,
    pub use_request_idle_callback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_font_url: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ga: Option<GaSettings>,
    pub translations: BTreeMap<Locale, BTreeMap<&'static str, &'static str>>,
}

impl RuntimeSettings {
    pub fn from_config(config: &BannerConfig) -> Self {
        let behavior = &config.behavior;
        let footer = &config.branding.footer_link;
        let floating_button = footer.enabled && footer.style.has_floating();
        let icon_link = footer.style.has_inline()
            && footer.inline_style.link_type == InlineLinkType::IconText;
        let ga = &config.integrations.google_analytics;

        Self {
            cookie_name: CONSENT_COOKIE,
            cookie_expiry: behavior.cookie_expiry.max(1),
            auto_show: behavior.auto_show,
            dismiss_on_scroll: behavior.dismiss_on_scroll,
            show_preferences: behavior.show_preferences,
            language: config.language.as_str(),
            google_consent_mode: config.advanced.google_consent_mode,
            floating_button,
            icons: footer.icons(),
            use_request_idle_callback: config.advanced.performance.use_request_idle_callback,
            icon_font_url: (floating_button || icon_link).then_some(ICON_FONT_URL),
            ga: ga.is_active().then(|| GaSettings {
                measurement_id: ga.measurement_id.trim().to_string(),
                track_consent_events: ga.track_consent_events,
                track_impressions: ga.track_impressions,
                anonymize_ip: ga.anonymize_ip,
            }),
            translations: translation_tables(),
        }
    }
}

/// The full runtime IIFE for `config`.
pub fn generate_runtime_script(config: &BannerConfig) -> String {
    let settings = RuntimeSettings::from_config(config);
    let plan = LoadPlan::from_config(config);

    let ga_block = if settings.ga.is_some() {
        GA_TEMPLATE
    } else {
        GA_STUB_TEMPLATE
    };

    let mut template = Template::new("runtime.js", RUNTIME_TEMPLATE)
        .set("settings", Fragment::json(&settings))
        .set("ga", Fragment::trusted(ga_block.trim_end()));

    for category in &plan.categories {
        let body = render_loaders(
            &category.loaders,
            LoaderOptions {
                lazy: category.lazy,
            },
        );
        // Loader bodies sit two levels deep inside the IIFE.
        let indented = body
            .lines()
            .map(|line| format!("  {line}"))
            .collect::<Vec<_>>()
            .join("\n");
        template = template.set(loader_slot(category.category), Fragment::trusted(indented));
    }

    debug!(
        target: "bannergen::generator",
        ga = settings.ga.is_some(),
        consent_mode = settings.google_consent_mode,
        loaders = plan.categories.iter().map(|c| c.loaders.len()).sum::<usize>(),
        "Assembled runtime script"
    );
    template.render()
}

/// Config-independent Consent Mode bootstrap for the top of `<head>`.
pub fn consent_init_script() -> &'static str {
    CONSENT_INIT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FooterLinkStyle, Language, TrackingScript};
    use crate::utils::template::slot_names;
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    fn script(id: &str, category: TrackingCategory, code: &str) -> TrackingScript {
        TrackingScript {
            id: id.into(),
            name: format!("{id} script"),
            category,
            script_code: code.into(),
            ..TrackingScript::default()
        }
    }

    fn analytics_config() -> BannerConfig {
        let mut cfg = BannerConfig::default();
        cfg.behavior.cookie_expiry = 30;
        cfg.scripts.tracking_performance.push(script(
            "ga",
            TrackingCategory::TrackingPerformance,
            "<script>window.gaLoaded = true;</script>",
        ));
        cfg
    }

    /// Body of a top-level `function signature { ... }` in the rendered runtime.
    fn function_body<'a>(js: &'a str, signature: &str) -> &'a str {
        let header = format!("function {signature} {{\n");
        let start = js.find(&header).unwrap() + header.len();
        let end = js[start..].find("\n  }\n").unwrap();
        &js[start..start + end]
    }

    #[test]
    fn every_template_slot_is_filled() {
        let js = generate_runtime_script(&BannerConfig::default());
        assert!(!js.contains("{{"));
        assert_eq!(
            slot_names(RUNTIME_TEMPLATE),
            vec![
                "settings",
                "strictly_necessary",
                "functionality",
                "analytics",
                "marketing",
                "ga"
            ]
        );
    }

    #[test]
    fn loaders_are_placed_in_their_category_function() {
        let js = generate_runtime_script(&analytics_config());
        let encoded = STANDARD.encode("window.gaLoaded = true;");
        assert!(function_body(&js, "loadAnalyticsScripts()").contains(&format!(
            "injectInlineScript(\"{encoded}\", \"ga script\", \"trackingPerformance_ga\");"
        )));
        for empty in [
            "loadStrictlyNecessaryScripts()",
            "loadFunctionalityScripts()",
            "loadMarketingScripts()",
        ] {
            assert!(function_body(&js, empty).contains("No active scripts"));
        }
    }

    #[test]
    fn load_scripts_gates_each_category_on_its_flag() {
        let js = generate_runtime_script(&BannerConfig::default());
        let body = function_body(&js, "loadScripts(consent)");
        let necessary = body.find("loadStrictlyNecessaryScripts();").unwrap();
        let functionality = body.find("if (consent.functionality)").unwrap();
        let analytics = body.find("if (consent.analytics)").unwrap();
        let marketing = body.find("if (consent.marketing)").unwrap();
        assert!(necessary < functionality && functionality < analytics && analytics < marketing);
        assert!(!body[..functionality].contains("if ("));
    }

    #[test]
    fn reopen_shows_the_banner() {
        let js = generate_runtime_script(&BannerConfig::default());
        let body = function_body(&js, "reopen()");
        assert!(body.contains("showBanner();"));
        assert!(!body.contains("showModal"));
    }

    #[test]
    fn non_object_cookie_reads_as_undecided() {
        let js = generate_runtime_script(&BannerConfig::default());
        let body = function_body(&js, "readConsent()");
        let guard = body.find("typeof parsed !== 'object'").unwrap();
        let normalize = body.find("normalizeConsent(parsed)").unwrap();
        assert!(guard < normalize);
        assert!(body.contains("Array.isArray(parsed)"));
    }

    #[test]
    fn scroll_dismiss_requires_a_visible_banner() {
        let js = generate_runtime_script(&BannerConfig::default());
        let body = function_body(&js, "onScroll()");
        let guard = body.find("!isVisible(byId('cookie-banner'))").unwrap();
        let event = body.find("trackEvent('dismiss'").unwrap();
        assert!(guard < event);
    }

    #[test]
    fn lazy_analytics_uses_schedule_task() {
        let mut cfg = analytics_config();
        cfg.advanced.performance.lazy_load_analytics = true;
        let js = generate_runtime_script(&cfg);
        assert!(function_body(&js, "loadAnalyticsScripts()")
            .trim_start()
            .starts_with("scheduleTask(function () { injectInlineScript("));
    }

    #[test]
    fn settings_carry_cookie_and_consent_mode() {
        let mut cfg = analytics_config();
        cfg.language = Language::Fr;
        let settings = serde_json::to_value(RuntimeSettings::from_config(&cfg)).unwrap();
        assert_eq!(settings["cookieName"], "cookie_consent");
        assert_eq!(settings["cookieExpiry"], 30);
        assert_eq!(settings["googleConsentMode"], true);
        assert_eq!(settings["language"], "fr");
        assert_eq!(settings["icons"]["accepted"], "verified_user");
        assert!(settings.get("ga").is_none());
    }

    #[test]
    fn ga_block_only_when_configured() {
        let mut cfg = BannerConfig::default();
        let js = generate_runtime_script(&cfg);
        assert!(js.contains("function initGA() {}"));
        assert!(!js.contains("googletagmanager"));

        cfg.integrations.google_analytics.enabled = true;
        cfg.integrations.google_analytics.measurement_id = "G-TEST123".into();
        let js = generate_runtime_script(&cfg);
        assert!(js.contains("https://www.googletagmanager.com/gtag/js?id="));
        assert!(js.contains("\"measurementId\":\"G-TEST123\""));
    }

    #[test]
    fn consent_update_maps_every_signal() {
        let js = generate_runtime_script(&BannerConfig::default());
        let body = function_body(&js, "updateConsentMode(consent)");
        for needle in [
            "window.gtag('consent', 'update'",
            "analytics_storage: grant(consent.analytics)",
            "ad_storage: grant(consent.marketing)",
            "ad_user_data: grant(consent.marketing)",
            "ad_personalization: grant(consent.marketing)",
            "functionality_storage: grant(consent.functionality)",
            "security_storage: 'granted'",
        ] {
            assert!(body.contains(needle), "{needle}");
        }
    }

    #[test]
    fn hostile_names_cannot_close_the_script_element() {
        let mut cfg = BannerConfig::default();
        cfg.scripts.functionality.push(TrackingScript {
            name: "</script><script>alert(1)</script>".into(),
            ..script("x", TrackingCategory::Functionality, "track();")
        });
        cfg.text.title = "</script>".into();
        let js = generate_runtime_script(&cfg);
        assert!(!js.to_ascii_lowercase().contains("</script"));
    }

    #[test]
    fn icon_font_only_when_icons_are_rendered() {
        let mut cfg = BannerConfig::default();
        assert_eq!(
            RuntimeSettings::from_config(&cfg).icon_font_url,
            Some(ICON_FONT_URL)
        );
        cfg.branding.footer_link.style = FooterLinkStyle::Inline;
        assert_eq!(RuntimeSettings::from_config(&cfg).icon_font_url, None);
        cfg.branding.footer_link.enabled = false;
        cfg.branding.footer_link.inline_style.link_type = InlineLinkType::IconText;
        assert_eq!(
            RuntimeSettings::from_config(&cfg).icon_font_url,
            Some(ICON_FONT_URL)
        );
    }

    #[test]
    fn consent_init_denies_by_default() {
        let init = consent_init_script();
        assert!(init.contains("window.gtag('consent', 'default'"));
        assert!(init.contains("wait_for_update: 500"));
        assert_eq!(init.matches("'denied'").count(), 6);
    }
}
