use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, info, trace};

use super::consent::{ConsentIcon, ConsentState, Toggle, Toggles};
use super::host::{BrowserHost, CookieWrite, Deferral, GtagCall, Signal, UiElement};
use super::injector::{Injection, ScriptInjector};
use crate::config::{BannerConfig, TrackingCategory};
use crate::generator::runtime_js::RuntimeSettings;
use crate::generator::scripts::{LoadPlan, ScriptLoader};

const SCROLL_DISMISS_THRESHOLD: f64 = 100.0;
const IDLE_TIMEOUT_MS: u32 = 2000;
const GTAG_SRC: &str = "https://www.googletagmanager.com/gtag/js?id=";

/// What the visitor currently sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiState {
    pub banner: bool,
    pub modal: bool,
    pub floating: bool,
    pub toggles: Toggles,
}

/// The consent state machine of the generated runtime, executed against a [`BrowserHost`].
///
/// Every public method corresponds to one visitor interaction or page event
/// and produces the same effects, in the same order, as the emitted JavaScript.
pub struct ConsentRuntime<H: BrowserHost> {
    settings: RuntimeSettings,
    has_modal: bool,
    plan: LoadPlan,
    host: H,
    injector: ScriptInjector,
    pending: VecDeque<ScriptLoader>,
    ui: UiState,
    ga_initialized: bool,
    listening_for_scroll: bool,
    scroll_dismissed: bool,
}

impl<H: BrowserHost> ConsentRuntime<H> {
    pub fn new(config: &BannerConfig, host: H) -> Self {
        Self {
            settings: RuntimeSettings::from_config(config),
            has_modal: config.behavior.show_preferences,
            plan: LoadPlan::from_config(config),
            host,
            injector: ScriptInjector::new(),
            pending: VecDeque::new(),
            ui: UiState::default(),
            ga_initialized: false,
            listening_for_scroll: false,
            scroll_dismissed: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn ui(&self) -> UiState {
        self.ui
    }

    pub fn pending_tasks(&self) -> usize {
        self.pending.len()
    }

    /// The decision stored in the consent cookie, if any.
    pub fn stored_consent(&self) -> Option<ConsentState> {
        let raw = self.host.cookie(self.settings.cookie_name)?;
        let parsed = ConsentState::from_cookie_value(&raw);
        if parsed.is_none() {
            debug!(target: "bannergen::runtime", "Ignoring unreadable consent cookie");
        }
        parsed
    }

    /// `init()` on DOMContentLoaded.
    pub fn page_load(&mut self) {
        if let Some(consent) = self.stored_consent() {
            info!(target: "bannergen::runtime", ?consent, "Returning visitor");
            self.update_consent_mode(consent);
            self.load_scripts(consent);
            self.update_floating_icon(Some(consent));
            self.show_floating(true);
            return;
        }

        info!(target: "bannergen::runtime", auto_show = self.settings.auto_show, "No stored consent");
        self.load_scripts(ConsentState::reject_all());
        self.update_floating_icon(None);
        if self.settings.auto_show {
            self.show_banner();
            self.track_event("impression", None);
        } else {
            self.show_floating(true);
        }
        self.listening_for_scroll = self.settings.dismiss_on_scroll;
    }

    /// "Accept all" in the banner or the modal.
    pub fn accept_all(&mut self) {
        self.apply_consent(ConsentState::accept_all(), "accept_all");
    }

    /// "Reject" in the banner. GA is initialized only to record the rejection.
    pub fn reject(&mut self) {
        let consent = ConsentState::reject_all();
        self.persist(consent);
        self.update_consent_mode(consent);
        self.load_scripts(consent);
        self.update_floating_icon(Some(consent));
        self.hide_modal();
        self.hide_banner();
        self.init_ga();
        self.track_event("reject", Some(consent));
    }

    /// Open the preferences modal with switches reflecting the stored decision.
    pub fn open_preferences(&mut self) {
        if !self.has_modal {
            return;
        }
        self.ui.toggles = Toggles::from_consent(self.stored_consent());
        self.ui.modal = true;
        self.host.set_visible(UiElement::PreferencesModal, true);
    }

    pub fn close_preferences(&mut self) {
        self.hide_modal();
    }

    pub fn set_toggle(&mut self, toggle: Toggle, on: bool) {
        self.ui.toggles.set(toggle, on);
    }

    /// "Save preferences" in the modal.
    pub fn confirm_preferences(&mut self) {
        let consent = ConsentState::from_toggles(self.ui.toggles);
        self.apply_consent(consent, "save_preferences");
    }

    /// Floating button or inline footer link: the banner is shown again and the
    /// stored decision is left untouched. The modal stays behind its Preferences button.
    pub fn reopen(&mut self) {
        self.show_banner();
    }

    /// Page scrolled to `y` pixels.
    ///
    /// Past the threshold an undecided visitor's visible banner is hidden and a
    /// `dismiss` event is tracked, but nothing is persisted.
    pub fn scroll_to(&mut self, y: f64) {
        if !self.listening_for_scroll || self.scroll_dismissed || y <= SCROLL_DISMISS_THRESHOLD {
            return;
        }
        self.scroll_dismissed = true;
        self.listening_for_scroll = false;
        if self.stored_consent().is_some() || !self.ui.banner {
            return;
        }
        debug!(target: "bannergen::runtime", y, "Banner dismissed by scrolling");
        self.hide_banner();
        self.track_event("dismiss", None);
    }

    /// Run every task deferred through `scheduleTask`, in scheduling order.
    pub fn run_pending_tasks(&mut self) -> usize {
        let mut ran = 0;
        while let Some(loader) = self.pending.pop_front() {
            self.inject(&loader);
            ran += 1;
        }
        ran
    }

    fn apply_consent(&mut self, consent: ConsentState, event: &str) {
        info!(target: "bannergen::runtime", ?consent, %event, "Consent decided");
        self.persist(consent);
        self.update_consent_mode(consent);
        self.load_scripts(consent);
        self.update_floating_icon(Some(consent));
        self.hide_modal();
        self.hide_banner();
        self.track_event(event, Some(consent));
    }

    fn persist(&mut self, consent: ConsentState) {
        let secure = self.host.is_https();
        self.host.set_cookie(CookieWrite {
            name: self.settings.cookie_name.to_string(),
            value: consent.to_cookie_value(),
            max_age_days: self.settings.cookie_expiry,
            path: "/",
            same_site: "Lax",
            secure,
        });
    }

    fn update_consent_mode(&mut self, consent: ConsentState) {
        if !self.settings.google_consent_mode {
            return;
        }
        let marketing = Signal::from(consent.marketing);
        let functionality = Signal::from(consent.functionality);
        let signals = BTreeMap::from([
            ("analytics_storage", Signal::from(consent.analytics)),
            ("ad_storage", marketing),
            ("ad_user_data", marketing),
            ("ad_personalization", marketing),
            ("functionality_storage", functionality),
            ("personalization_storage", functionality),
            ("security_storage", Signal::Granted),
        ]);
        self.host.gtag(GtagCall::ConsentUpdate { signals });
    }

    /// `loadScripts(consent)`: categories in fixed order, each gated on its flag.
    fn load_scripts(&mut self, consent: ConsentState) {
        let plan = std::mem::take(&mut self.plan.categories);
        for category in &plan {
            if !consent.allows(category.category) {
                trace!(target: "bannergen::runtime", category = category.category.as_str(), "Category not consented");
                continue;
            }
            for loader in &category.loaders {
                if category.lazy {
                    self.schedule(loader.clone());
                } else {
                    self.inject(loader);
                }
            }
            if category.category == TrackingCategory::TrackingPerformance {
                self.init_ga();
            }
        }
        self.plan.categories = plan;
    }

    fn schedule(&mut self, loader: ScriptLoader) {
        let deferral =
            if self.settings.use_request_idle_callback && self.host.idle_callback_available() {
                Deferral::IdleCallback {
                    timeout_ms: IDLE_TIMEOUT_MS,
                }
            } else {
                Deferral::Timeout { delay_ms: 1 }
            };
        self.host.scheduled(&loader.name, deferral);
        self.pending.push_back(loader);
    }

    fn inject(&mut self, loader: &ScriptLoader) -> Injection {
        self.injector.inject(&mut self.host, loader)
    }

    fn init_ga(&mut self) {
        let Some(ga) = self.settings.ga.clone() else {
            return;
        };
        if self.ga_initialized {
            return;
        }
        self.ga_initialized = true;
        let src = format!("{GTAG_SRC}{}", urlencoding::encode(&ga.measurement_id));
        self.injector
            .load_external(&mut self.host, &src, "Google Analytics");
        self.host.gtag(GtagCall::Js);
        self.host.gtag(GtagCall::Config {
            measurement_id: ga.measurement_id,
            anonymize_ip: ga.anonymize_ip,
        });
    }

    fn track_event(&mut self, name: &str, consent: Option<ConsentState>) {
        let Some(ga) = &self.settings.ga else {
            return;
        };
        let enabled = if name == "impression" {
            ga.track_impressions
        } else {
            ga.track_consent_events
        };
        if enabled {
            self.host.gtag(GtagCall::Event {
                name: name.to_string(),
                consent,
            });
        }
    }

    fn update_floating_icon(&mut self, consent: Option<ConsentState>) {
        if !self.settings.floating_button {
            return;
        }
        let icons = &self.settings.icons;
        let icon = match consent.map(|c| c.icon()) {
            Some(ConsentIcon::Accepted) => &icons.accepted,
            Some(ConsentIcon::Rejected) => &icons.rejected,
            Some(ConsentIcon::Default) | None => &icons.default,
        };
        let icon = icon.clone();
        self.host.set_floating_icon(&icon);
    }

    fn show_floating(&mut self, visible: bool) {
        if self.settings.floating_button {
            self.ui.floating = visible;
            self.host.set_visible(UiElement::FloatingButton, visible);
        }
    }

    fn show_banner(&mut self) {
        self.ui.banner = true;
        self.host.set_visible(UiElement::Banner, true);
        self.show_floating(false);
    }

    fn hide_banner(&mut self) {
        self.ui.banner = false;
        self.host.set_visible(UiElement::Banner, false);
        self.show_floating(true);
    }

    fn hide_modal(&mut self) {
        if self.has_modal {
            self.ui.modal = false;
            self.host.set_visible(UiElement::PreferencesModal, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackingScript;
    use crate::generator::runtime_js::CONSENT_COOKIE;
    use crate::runtime::host::{ConsoleLevel, DomInsertion, RecordingHost};
    use pretty_assertions::assert_eq;

    fn script(id: &str, category: TrackingCategory, code: &str) -> TrackingScript {
        TrackingScript {
            id: id.into(),
            name: id.into(),
            category,
            script_code: code.into(),
            ..TrackingScript::default()
        }
    }

    /// `cookieExpiry=30`, one inline analytics script and GA4 with consent events.
    fn analytics_config() -> BannerConfig {
        let mut cfg = BannerConfig::default();
        cfg.behavior.cookie_expiry = 30;
        cfg.scripts.tracking_performance.push(script(
            "ga.js",
            TrackingCategory::TrackingPerformance,
            "<script>window.analyticsLoaded = true;</script>",
        ));
        let ga = &mut cfg.integrations.google_analytics;
        ga.enabled = true;
        ga.measurement_id = "G-TEST".into();
        ga.track_consent_events = true;
        ga.track_impressions = true;
        cfg
    }

    /// One script per list, named after its list.
    fn all_categories_config() -> BannerConfig {
        let mut cfg = BannerConfig::default();
        cfg.scripts.strictly_necessary.push(script(
            "necessary",
            TrackingCategory::StrictlyNecessary,
            "necessary()",
        ));
        cfg.scripts
            .functionality
            .push(script("functionality", TrackingCategory::Functionality, "functionality()"));
        cfg.scripts.tracking_performance.push(script(
            "analytics",
            TrackingCategory::TrackingPerformance,
            "analytics()",
        ));
        cfg.scripts.targeting_advertising.push(script(
            "marketing",
            TrackingCategory::TargetingAdvertising,
            "marketing()",
        ));
        cfg
    }

    fn injected_names(host: &RecordingHost) -> Vec<&str> {
        host.insertions.iter().map(DomInsertion::name).collect()
    }

    fn stored(host: &RecordingHost) -> ConsentState {
        ConsentState::from_cookie_value(&host.cookies[CONSENT_COOKIE]).unwrap()
    }

    #[test]
    fn first_visit_shows_banner_and_hides_floating_button() {
        let mut rt = ConsentRuntime::new(&analytics_config(), RecordingHost::new());
        rt.page_load();
        let ui = rt.ui();
        assert!(ui.banner);
        assert!(!ui.floating);
        assert_eq!(rt.host().events().collect::<Vec<_>>(), vec!["impression"]);
        assert!(rt.host().cookie_writes.is_empty());
    }

    #[test]
    fn accept_flow_persists_loads_once_and_grants() {
        let mut rt = ConsentRuntime::new(&analytics_config(), RecordingHost::new());
        rt.page_load();
        rt.accept_all();
        let host = rt.into_host();

        let write = &host.cookie_writes[0];
        assert_eq!(write.name, "cookie_consent");
        assert_eq!(write.max_age_days, 30);
        assert!(stored(&host).analytics);

        assert_eq!(host.insertions_named("ga.js").count(), 1);
        let granted = host.gtag_calls.iter().any(|call| {
            matches!(call, GtagCall::ConsentUpdate { signals }
                if signals["analytics_storage"] == Signal::Granted
                    && signals["ad_storage"] == Signal::Granted
                    && signals["security_storage"] == Signal::Granted)
        });
        assert!(granted);
        assert!(!host.is_visible(UiElement::Banner));
        assert!(host.is_visible(UiElement::FloatingButton));
        assert_eq!(host.floating_icon.as_deref(), Some("verified_user"));
    }

    #[test]
    fn reject_flow_records_event_without_loading_analytics() {
        let mut rt = ConsentRuntime::new(&analytics_config(), RecordingHost::new());
        rt.page_load();
        rt.reject();
        let host = rt.into_host();

        assert_eq!(stored(&host), ConsentState::reject_all());
        assert_eq!(host.insertions_named("ga.js").count(), 0);
        assert_eq!(host.events().filter(|e| *e == "reject").count(), 1);
        // Transient GA bootstrap happened exactly once.
        let configs = host
            .gtag_calls
            .iter()
            .filter(|c| matches!(c, GtagCall::Config { .. }))
            .count();
        assert_eq!(configs, 1);
        assert_eq!(host.floating_icon.as_deref(), Some("block"));
    }

    #[test]
    fn returning_visitor_reloads_consented_categories() {
        let cookie = ConsentState {
            essential: true,
            functionality: false,
            analytics: true,
            marketing: false,
        }
        .to_cookie_value();
        let host = RecordingHost::new().with_cookie(CONSENT_COOKIE, cookie);
        let mut rt = ConsentRuntime::new(&all_categories_config(), host);
        rt.page_load();
        let host = rt.into_host();

        assert!(!host.was_shown(UiElement::Banner));
        assert_eq!(injected_names(&host), vec!["necessary", "analytics"]);
        assert!(host.is_visible(UiElement::FloatingButton));
        assert_eq!(host.floating_icon.as_deref(), Some("cookie"));
    }

    #[test]
    fn loaders_run_exactly_for_consented_categories() {
        for bits in 0u8..8 {
            let consent = ConsentState {
                essential: true,
                functionality: bits & 1 != 0,
                analytics: bits & 2 != 0,
                marketing: bits & 4 != 0,
            };
            for with_scripts in [true, false] {
                let cfg = if with_scripts {
                    all_categories_config()
                } else {
                    BannerConfig::default()
                };
                let host = RecordingHost::new().with_cookie(CONSENT_COOKIE, consent.to_cookie_value());
                let mut rt = ConsentRuntime::new(&cfg, host);
                rt.page_load();

                let expected: Vec<&str> = if with_scripts {
                    [
                        (true, "necessary"),
                        (consent.functionality, "functionality"),
                        (consent.analytics, "analytics"),
                        (consent.marketing, "marketing"),
                    ]
                    .into_iter()
                    .filter_map(|(on, name)| on.then_some(name))
                    .collect()
                } else {
                    Vec::new()
                };
                assert_eq!(injected_names(rt.host()), expected, "{consent:?}");
            }
        }
    }

    #[test]
    fn repeated_consent_changes_inject_each_script_once() {
        let mut cfg = all_categories_config();
        cfg.scripts.functionality.push(script(
            "widget",
            TrackingCategory::Functionality,
            r#"<script src="https://cdn.example.com/widget.js"></script>"#,
        ));
        let mut rt = ConsentRuntime::new(&cfg, RecordingHost::new());
        rt.page_load();
        rt.accept_all();
        rt.reopen();
        rt.open_preferences();
        rt.set_toggle(Toggle::Functionality, false);
        rt.confirm_preferences();
        rt.reopen();
        rt.open_preferences();
        rt.set_toggle(Toggle::Functionality, true);
        rt.confirm_preferences();
        rt.accept_all();

        let host = rt.into_host();
        for name in ["necessary", "functionality", "analytics", "marketing", "widget"] {
            assert_eq!(host.insertions_named(name).count(), 1, "{name}");
        }
    }

    #[test]
    fn preferences_map_targeting_and_social_to_marketing() {
        let mut rt = ConsentRuntime::new(&all_categories_config(), RecordingHost::new());
        rt.page_load();
        assert!(rt.ui().banner);
        rt.open_preferences();
        assert!(rt.ui().modal);
        assert_eq!(rt.ui().toggles, Toggles::default());
        rt.set_toggle(Toggle::Social, true);
        rt.confirm_preferences();

        let host = rt.into_host();
        let consent = stored(&host);
        assert!(consent.marketing && !consent.analytics && !consent.functionality);
        assert_eq!(injected_names(&host), vec!["necessary", "marketing"]);
        assert!(!host.is_visible(UiElement::PreferencesModal));
    }

    #[test]
    fn reopen_shows_banner_and_keeps_cookie() {
        let mut rt = ConsentRuntime::new(&all_categories_config(), RecordingHost::new());
        rt.page_load();
        rt.accept_all();
        assert!(!rt.ui().banner);

        rt.reopen();
        assert!(rt.ui().banner);
        assert!(!rt.ui().modal);
        assert!(!rt.ui().floating);
        assert!(rt.host().is_visible(UiElement::Banner));
        assert_eq!(rt.host().cookie_writes.len(), 1);
        assert_eq!(rt.stored_consent(), Some(ConsentState::accept_all()));

        rt.open_preferences();
        assert!(rt.ui().toggles.targeting && rt.ui().toggles.social);
    }

    #[test]
    fn reopen_without_modal_shows_banner_again() {
        let mut cfg = all_categories_config();
        cfg.behavior.show_preferences = false;
        let mut rt = ConsentRuntime::new(&cfg, RecordingHost::new());
        rt.page_load();
        rt.reject();
        assert!(!rt.ui().banner);
        rt.reopen();
        assert!(rt.ui().banner);
        assert!(!rt.ui().modal);
    }

    #[test]
    fn scroll_dismiss_hides_without_persisting() {
        let mut cfg = analytics_config();
        cfg.behavior.dismiss_on_scroll = true;
        let mut rt = ConsentRuntime::new(&cfg, RecordingHost::new());
        rt.page_load();
        rt.scroll_to(50.0);
        assert!(rt.ui().banner);
        rt.scroll_to(150.0);
        rt.scroll_to(300.0);
        assert!(!rt.ui().banner);
        assert!(rt.ui().floating);

        let host = rt.into_host();
        assert!(host.cookie_writes.is_empty());
        assert_eq!(host.events().filter(|e| *e == "dismiss").count(), 1);
    }

    #[test]
    fn scroll_without_a_shown_banner_tracks_nothing() {
        let mut cfg = analytics_config();
        cfg.behavior.dismiss_on_scroll = true;
        cfg.behavior.auto_show = false;
        let mut rt = ConsentRuntime::new(&cfg, RecordingHost::new());
        rt.page_load();
        rt.scroll_to(400.0);
        assert!(!rt.ui().banner);

        let host = rt.into_host();
        assert_eq!(host.events().filter(|e| *e == "dismiss").count(), 0);
        assert!(host.cookie_writes.is_empty());
    }

    #[test]
    fn non_object_cookie_is_treated_as_first_visit() {
        let host = RecordingHost::new().with_cookie(CONSENT_COOKIE, "null");
        let mut rt = ConsentRuntime::new(&analytics_config(), host);
        rt.page_load();
        assert_eq!(rt.stored_consent(), None);
        assert!(rt.ui().banner);
        assert_eq!(injected_names(rt.host()), Vec::<&str>::new());
    }

    #[test]
    fn scroll_is_ignored_without_dismiss_on_scroll() {
        let mut rt = ConsentRuntime::new(&analytics_config(), RecordingHost::new());
        rt.page_load();
        rt.scroll_to(500.0);
        assert!(rt.ui().banner);
    }

    #[test]
    fn lazy_categories_defer_but_keep_category_order() {
        let mut cfg = all_categories_config();
        cfg.advanced.performance.defer_non_critical_scripts = true;
        cfg.advanced.performance.use_request_idle_callback = true;
        let host = RecordingHost::new().with_idle_callback(true);
        let mut rt = ConsentRuntime::new(&cfg, host);
        rt.page_load();
        rt.accept_all();

        assert_eq!(injected_names(rt.host()), vec!["necessary"]);
        assert_eq!(rt.pending_tasks(), 3);
        let scheduled: Vec<_> = rt.host().scheduled.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(scheduled, vec!["functionality", "analytics", "marketing"]);
        assert!(matches!(
            rt.host().scheduled[0].deferral,
            Deferral::IdleCallback { timeout_ms: 2000 }
        ));

        assert_eq!(rt.run_pending_tasks(), 3);
        assert_eq!(
            injected_names(rt.host()),
            vec!["necessary", "functionality", "analytics", "marketing"]
        );
    }

    #[test]
    fn missing_idle_callback_falls_back_to_timeout() {
        let mut cfg = all_categories_config();
        cfg.advanced.performance.lazy_load_analytics = true;
        cfg.advanced.performance.use_request_idle_callback = true;
        let mut rt = ConsentRuntime::new(&cfg, RecordingHost::new());
        rt.page_load();
        rt.accept_all();
        let scheduled = &rt.host().scheduled;
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].deferral, Deferral::Timeout { delay_ms: 1 });
    }

    #[test]
    fn broken_script_does_not_block_others() {
        let host = RecordingHost::new().failing_on("functionality");
        let mut rt = ConsentRuntime::new(&all_categories_config(), host);
        rt.page_load();
        rt.accept_all();
        let host = rt.into_host();
        assert_eq!(injected_names(&host), vec!["necessary", "analytics", "marketing"]);
        assert_eq!(host.console.len(), 1);
        assert_eq!(host.console[0].level, ConsoleLevel::Error);
        assert!(stored(&host).functionality);
    }

    #[test]
    fn consent_mode_off_sends_no_updates() {
        let mut cfg = analytics_config();
        cfg.advanced.google_consent_mode = false;
        let mut rt = ConsentRuntime::new(&cfg, RecordingHost::new());
        rt.page_load();
        rt.accept_all();
        assert!(
            !rt.host()
                .gtag_calls
                .iter()
                .any(|c| matches!(c, GtagCall::ConsentUpdate { .. }))
        );
    }

    #[test]
    fn secure_flag_follows_protocol() {
        let mut rt = ConsentRuntime::new(&analytics_config(), RecordingHost::new().with_https(true));
        rt.page_load();
        rt.accept_all();
        assert!(rt.host().cookie_writes[0].secure);
    }
}
