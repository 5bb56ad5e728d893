use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;

use crate::utils::escape::sanitize_identifier;

/// Declares a string-backed configuration enum whose deserialization never fails:
/// unknown values fall back to the declared default and are reported with `warn!`.
macro_rules! lenient_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident (default = $default:ident) {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, JsonSchema)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire representation used in JSON configs.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }

            /// Parse a wire value, falling back to the default for unknown input.
            pub fn parse_lenient(raw: &str) -> Self {
                match raw.trim() {
                    $($wire => Self::$variant,)+
                    other => {
                        tracing::warn!(
                            target: "bannergen::config",
                            field = stringify!($name),
                            value = %other,
                            fallback = Self::$default.as_str(),
                            "Unrecognized value; using default"
                        );
                        Self::$default
                    }
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Ok(Self::parse_lenient(&raw))
            }
        }
    };
}

/// Root configuration of a cookie banner.
///
/// A `BannerConfig` is produced by the configuration UI (or loaded from storage) and
/// consumed once per generation call. Every group defaults to the factory
/// configuration, so partially specified JSON documents still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct BannerConfig {
    /// Schema version (read by the migration layer, not by the generator).
    pub version: String,
    /// ISO-8601 timestamp of the last edit.
    pub last_updated: String,
    /// Regulatory framework defaults the UI derived the behavior from.
    pub compliance: Compliance,
    /// Display label shown in the dashboard. Never rendered into output.
    pub name: String,
    pub position: BannerPosition,
    pub theme: Theme,
    pub language: Language,
    pub colors: Colors,
    pub text: BannerText,
    #[validate]
    pub behavior: Behavior,
    #[validate]
    pub branding: Branding,
    pub layout: Layout,
    pub scripts: Scripts,
    pub integrations: Integrations,
    pub advanced: Advanced,
}

lenient_enum! {
    /// Where the main banner is anchored on the page.
    pub enum BannerPosition (default = Bottom) {
        Top => "top",
        Bottom => "bottom",
        FloatingBottomRight => "floating-bottom-right",
        FloatingBottomLeft => "floating-bottom-left",
        FloatingTopRight => "floating-top-right",
        FloatingTopLeft => "floating-top-left",
        ModalCenter => "modal-center",
        ModalBottom => "modal-bottom",
        ModalTop => "modal-top",
        SlideInRight => "slide-in-right",
        SlideInLeft => "slide-in-left",
        SlideInTop => "slide-in-top",
        SlideInBottom => "slide-in-bottom",
    }
}

impl BannerPosition {
    /// Full-width bars stretch edge to edge instead of floating as a card.
    pub fn is_bar(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

lenient_enum! {
    pub enum Theme (default = Light) {
        Light => "light",
        Dark => "dark",
        Custom => "custom",
    }
}

lenient_enum! {
    /// `auto` defers to the visitor's browser locale at runtime.
    pub enum Language (default = Auto) {
        Auto => "auto",
        En => "en",
        Fr => "fr",
    }
}

lenient_enum! {
    pub enum ComplianceFramework (default = Pipeda) {
        Pipeda => "pipeda",
        Gdpr => "gdpr",
        Ccpa => "ccpa",
        Lgpd => "lgpd",
        Quebec25 => "quebec-law-25",
        Custom => "custom",
    }
}

/// Compliance metadata. The generator only consumes the resulting
/// `behavior.cookieExpiry`; the rest is carried for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Compliance {
    pub framework: ComplianceFramework,
    pub requires_explicit_consent: bool,
    pub requires_opt_in: bool,
    pub requires_granular_consent: bool,
    pub requires_privacy_policy: bool,
    pub requires_data_retention_policy: bool,
    pub max_penalty: String,
    /// Consent lifetime in days recommended by the framework.
    pub consent_expiry: u32,
}

impl Default for Compliance {
    fn default() -> Self {
        Self {
            framework: ComplianceFramework::Pipeda,
            requires_explicit_consent: true,
            requires_opt_in: false,
            requires_granular_consent: true,
            requires_privacy_policy: true,
            requires_data_retention_policy: false,
            max_penalty: String::new(),
            consent_expiry: 365,
        }
    }
}

/// Base palette. Colors are CSS color strings (hex or `rgb()`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Colors {
    pub background: String,
    pub text: String,
    pub button: String,
    pub button_text: String,
    pub link: String,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            background: "#ffffff".into(),
            text: "#1f2937".into(),
            button: "#2563eb".into(),
            button_text: "#ffffff".into(),
            link: "#2563eb".into(),
        }
    }
}

/// User-supplied copy. Always HTML-escaped before it reaches the output.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct BannerText {
    pub title: String,
    pub message: String,
    pub accept_button: String,
    pub reject_button: String,
    pub preferences_button: String,
}

impl Default for BannerText {
    fn default() -> Self {
        Self {
            title: "We value your privacy".into(),
            message: "We use cookies to enhance your browsing experience, serve personalized content, and analyze our traffic.".into(),
            accept_button: "Accept All".into(),
            reject_button: "Reject All".into(),
            preferences_button: "Customize".into(),
        }
    }
}

lenient_enum! {
    /// Arrangement of the banner's action buttons.
    pub enum ButtonLayout (default = Inline) {
        Inline => "inline",
        Stacked => "stacked",
        Spread => "spread",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Behavior {
    /// Show the banner automatically to visitors without a stored decision.
    pub auto_show: bool,
    /// Hide the banner (without recording a decision) once the visitor scrolls.
    pub dismiss_on_scroll: bool,
    /// Render the preferences modal and the button that opens it.
    pub show_preferences: bool,
    /// Lifetime of the consent cookie, in days.
    #[validate(minimum = 1)]
    pub cookie_expiry: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_layout: Option<ButtonLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_reject_button: Option<bool>,
}

impl Behavior {
    /// The reject button is shown unless explicitly disabled.
    pub fn shows_reject_button(&self) -> bool {
        self.show_reject_button != Some(false)
    }
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            auto_show: true,
            dismiss_on_scroll: false,
            show_preferences: true,
            cookie_expiry: 365,
            button_layout: None,
            show_reject_button: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Branding {
    #[validate]
    pub logo: Logo,
    pub privacy_policy: PrivacyPolicy,
    pub footer_link: FooterLink,
}

lenient_enum! {
    pub enum LogoPosition (default = Left) {
        Left => "left",
        Center => "center",
        Right => "right",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Logo {
    pub enabled: bool,
    pub url: String,
    pub position: LogoPosition,
    /// Maximum rendered width in pixels.
    #[validate(minimum = 1)]
    pub max_width: u32,
    /// Maximum rendered height in pixels.
    #[validate(minimum = 1)]
    pub max_height: u32,
}

impl Logo {
    /// A logo is rendered only when enabled and pointing somewhere.
    pub fn is_visible(&self) -> bool {
        self.enabled && !self.url.trim().is_empty()
    }
}

impl Default for Logo {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            position: LogoPosition::Left,
            max_width: 120,
            max_height: 40,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PrivacyPolicy {
    pub url: String,
    pub text: String,
    pub open_in_new_tab: bool,
    pub required: bool,
}

impl Default for PrivacyPolicy {
    fn default() -> Self {
        Self {
            url: String::new(),
            text: "Privacy Policy".into(),
            open_in_new_tab: true,
            required: false,
        }
    }
}

lenient_enum! {
    /// Which reopen affordances are emitted.
    pub enum FooterLinkStyle (default = Floating) {
        Floating => "floating",
        Inline => "inline",
        Both => "both",
    }
}

impl FooterLinkStyle {
    pub fn has_floating(self) -> bool {
        matches!(self, Self::Floating | Self::Both)
    }

    pub fn has_inline(self) -> bool {
        matches!(self, Self::Inline | Self::Both)
    }
}

lenient_enum! {
    /// Alignment of the copy-paste footer link inside the host footer.
    pub enum FooterLinkPosition (default = Center) {
        Left => "left",
        Center => "center",
        Right => "right",
    }
}

lenient_enum! {
    pub enum FloatingPosition (default = BottomRight) {
        BottomRight => "bottom-right",
        BottomLeft => "bottom-left",
        TopRight => "top-right",
        TopLeft => "top-left",
    }
}

lenient_enum! {
    pub enum FloatingShape (default = Pill) {
        Circle => "circle",
        Pill => "pill",
        Square => "square",
    }
}

lenient_enum! {
    pub enum FloatingSize (default = Medium) {
        Small => "small",
        Medium => "medium",
        Large => "large",
    }
}

lenient_enum! {
    pub enum InlineLinkType (default = Plain) {
        Plain => "plain",
        Button => "button",
        IconText => "icon-text",
        Custom => "custom",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FooterLink {
    pub enabled: bool,
    pub text: String,
    pub position: FooterLinkPosition,
    pub style: FooterLinkStyle,
    pub floating_position: FloatingPosition,
    pub floating_style: FloatingStyle,
    pub inline_style: InlineStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icons: Option<FooterIcons>,
}

impl FooterLink {
    /// Icon names, falling back to the built-in set.
    pub fn icons(&self) -> FooterIcons {
        self.icons.clone().unwrap_or_default()
    }
}

impl Default for FooterLink {
    fn default() -> Self {
        Self {
            enabled: true,
            text: "Cookie Settings".into(),
            position: FooterLinkPosition::Center,
            style: FooterLinkStyle::Floating,
            floating_position: FloatingPosition::BottomRight,
            floating_style: FloatingStyle::default(),
            inline_style: InlineStyle::default(),
            icons: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FloatingStyle {
    pub shape: FloatingShape,
    pub size: FloatingSize,
    /// Defaults to `colors.button`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Defaults to `colors.buttonText`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    /// Show the label next to the icon (ignored for circles).
    pub show_text: bool,
    /// Replace the icon with the branding logo when one is configured.
    pub show_logo: bool,
}

impl Default for FloatingStyle {
    fn default() -> Self {
        Self {
            shape: FloatingShape::Pill,
            size: FloatingSize::Medium,
            background_color: None,
            text_color: None,
            show_text: true,
            show_logo: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct InlineStyle {
    pub link_type: InlineLinkType,
    /// Extra class applied to the `custom` template.
    pub custom_class: String,
    /// Logo shown by the `custom` template; a placeholder is emitted when empty.
    pub custom_logo_url: String,
    /// Link color override (defaults to `colors.link`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Material Symbols icon names for the floating button states.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FooterIcons {
    pub default: String,
    pub accepted: String,
    pub rejected: String,
}

impl Default for FooterIcons {
    fn default() -> Self {
        Self {
            default: "cookie".into(),
            accepted: "verified_user".into(),
            rejected: "block".into(),
        }
    }
}

lenient_enum! {
    pub enum LayoutWidth (default = Full) {
        Full => "full",
        Auto => "auto",
        Small => "small",
        Medium => "medium",
        Large => "large",
        Custom => "custom",
    }
}

lenient_enum! {
    pub enum BorderRadius (default = Medium) {
        None => "none",
        Small => "small",
        Medium => "medium",
        Large => "large",
        Full => "full",
    }
}

lenient_enum! {
    pub enum Spacing (default = Normal) {
        Compact => "compact",
        Normal => "normal",
        Spacious => "spacious",
    }
}

lenient_enum! {
    pub enum Margin (default = None) {
        None => "none",
        Small => "small",
        Medium => "medium",
        Large => "large",
    }
}

lenient_enum! {
    pub enum Shadow (default = Medium) {
        None => "none",
        Small => "small",
        Medium => "medium",
        Large => "large",
    }
}

lenient_enum! {
    pub enum Animation (default = Slide) {
        None => "none",
        Fade => "fade",
        Slide => "slide",
        Bounce => "bounce",
        Pulse => "pulse",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Layout {
    pub width: LayoutWidth,
    /// Pixel width used when `width` is `custom`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_width: Option<u32>,
    /// Upper bound on the rendered width, in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
    pub border_radius: BorderRadius,
    pub padding: Spacing,
    pub margin: Margin,
    pub shadow: Shadow,
    pub animation: Animation,
}

lenient_enum! {
    /// Consent bucket a tracking script belongs to.
    pub enum TrackingCategory (default = StrictlyNecessary) {
        StrictlyNecessary => "strictlyNecessary",
        Functionality => "functionality",
        TrackingPerformance => "trackingPerformance",
        TargetingAdvertising => "targetingAdvertising",
    }
}

impl TrackingCategory {
    /// Human-readable label used in logs and generated comments.
    pub const fn label(self) -> &'static str {
        match self {
            Self::StrictlyNecessary => "Strictly Necessary",
            Self::Functionality => "Functionality",
            Self::TrackingPerformance => "Tracking & Performance",
            Self::TargetingAdvertising => "Targeting & Advertising",
        }
    }
}

/// The four ordered script lists, one per consent category.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Scripts {
    pub strictly_necessary: Vec<TrackingScript>,
    pub functionality: Vec<TrackingScript>,
    pub tracking_performance: Vec<TrackingScript>,
    pub targeting_advertising: Vec<TrackingScript>,
}

impl Scripts {
    /// The list holding scripts of `category`.
    pub fn list(&self, category: TrackingCategory) -> &[TrackingScript] {
        match category {
            TrackingCategory::StrictlyNecessary => &self.strictly_necessary,
            TrackingCategory::Functionality => &self.functionality,
            TrackingCategory::TrackingPerformance => &self.tracking_performance,
            TrackingCategory::TargetingAdvertising => &self.targeting_advertising,
        }
    }

    pub fn list_mut(&mut self, category: TrackingCategory) -> &mut Vec<TrackingScript> {
        match category {
            TrackingCategory::StrictlyNecessary => &mut self.strictly_necessary,
            TrackingCategory::Functionality => &mut self.functionality,
            TrackingCategory::TrackingPerformance => &mut self.tracking_performance,
            TrackingCategory::TargetingAdvertising => &mut self.targeting_advertising,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackingScript {
    /// Stable identifier; unique within its list and used as the runtime dedup key.
    pub id: String,
    pub name: String,
    pub category: TrackingCategory,
    /// Pasted snippet (`<script>` tags, raw JS, or a bare URL). Empty means unconfigured.
    pub script_code: String,
    /// Optional markup for `<body>` (e.g. a `<noscript>` pixel).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_code: Option<String>,
    pub enabled: bool,
}

impl TrackingScript {
    /// Scripts that are switched off or have no code are skipped at generation time.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.script_code.trim().is_empty()
    }

    /// Runtime dedup key of the inline payload when listed under `list`.
    pub fn cache_key(&self, list: TrackingCategory) -> String {
        format!("{}_{}", list.as_str(), sanitize_identifier(&self.id))
    }

    /// Dedup key of the `<body>` markup.
    pub fn body_cache_key(&self, list: TrackingCategory) -> String {
        format!("{}_body", self.cache_key(list))
    }

    pub fn has_body_code(&self) -> bool {
        self.body_code.as_deref().is_some_and(|b| !b.trim().is_empty())
    }
}

impl Default for TrackingScript {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            category: TrackingCategory::StrictlyNecessary,
            script_code: String::new(),
            body_code: None,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Integrations {
    pub google_analytics: GoogleAnalytics,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GoogleAnalytics {
    pub enabled: bool,
    /// GA4 measurement id (`G-XXXXXXX`).
    pub measurement_id: String,
    pub track_consent_events: bool,
    pub track_impressions: bool,
    pub anonymize_ip: bool,
}

impl GoogleAnalytics {
    /// GA bootstrap code is only emitted when enabled with a measurement id.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.measurement_id.trim().is_empty()
    }
}

impl Default for GoogleAnalytics {
    fn default() -> Self {
        Self {
            enabled: false,
            measurement_id: String::new(),
            track_consent_events: true,
            track_impressions: false,
            anonymize_ip: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Advanced {
    /// Emit Google Consent Mode v2 `update` signals.
    pub google_consent_mode: bool,
    /// Appended verbatim to the end of the stylesheet.
    #[serde(rename = "customCSS")]
    pub custom_css: String,
    /// Site-owner JavaScript; not emitted by the generator.
    #[serde(rename = "customJS")]
    pub custom_js: String,
    pub performance: Performance,
}

impl Default for Advanced {
    fn default() -> Self {
        Self {
            google_consent_mode: true,
            custom_css: String::new(),
            custom_js: String::new(),
            performance: Performance::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Performance {
    pub defer_non_critical_scripts: bool,
    pub use_request_idle_callback: bool,
    pub lazy_load_analytics: bool,
    /// Prefix the HTML artifact with the handful of rules needed before the stylesheet loads.
    #[serde(rename = "inlineCriticalCSS")]
    pub inline_critical_css: bool,
}
