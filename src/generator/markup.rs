//! HTML fragments of the banner. Every builder is a pure function of the config.
//!
//! Element ids here are the contract with the runtime script; see
//! [`ids`] for the full list.

use crate::config::{
    BannerConfig, FloatingShape, FooterLinkPosition, InlineLinkType, LogoPosition,
};
use crate::generator::i18n::{I18nKey, Locale};
use crate::generator::styles;
use crate::utils::escape::sanitize_url;
use crate::utils::markup::{Element, Markup, Style};

/// DOM ids shared between the markup and the runtime.
pub mod ids {
    pub const BANNER: &str = "cookie-banner";
    pub const BANNER_TITLE: &str = "cookie-banner-title";
    pub const BANNER_MESSAGE: &str = "cookie-banner-message";
    pub const ACCEPT: &str = "cookie-accept";
    pub const REJECT: &str = "cookie-reject";
    pub const PREFERENCES: &str = "cookie-preferences";
    pub const MODAL: &str = "cookie-preferences-modal";
    pub const MODAL_TITLE: &str = "cookie-modal-title";
    pub const MODAL_CLOSE: &str = "cookie-modal-close";
    pub const MODAL_ACCEPT_ALL: &str = "cookie-modal-accept-all";
    pub const MODAL_SAVE: &str = "cookie-modal-save";
    pub const FLOATING: &str = "cookie-settings-button";
    pub const CRITICAL_CSS: &str = "cookie-banner-critical";
}

/// Toggle rows of the preferences modal: (`data-consent` key, title, description).
const TOGGLE_ROWS: [(&str, I18nKey, I18nKey); 4] = [
    (
        "functionality",
        I18nKey::FunctionalityTitle,
        I18nKey::FunctionalityDescription,
    ),
    (
        "analytics",
        I18nKey::AnalyticsTitle,
        I18nKey::AnalyticsDescription,
    ),
    (
        "targeting",
        I18nKey::TargetingTitle,
        I18nKey::TargetingDescription,
    ),
    ("social", I18nKey::SocialTitle, I18nKey::SocialDescription),
];

/// `data-consent` keys of the toggle rows, in render order.
pub fn toggle_keys() -> impl Iterator<Item = &'static str> {
    TOGGLE_ROWS.iter().map(|(key, _, _)| *key)
}

fn i18n(tag: &'static str, locale: Locale, key: I18nKey) -> Element {
    Element::new(tag)
        .attr("data-cookie-i18n", key.as_str())
        .text(locale.get(key))
}

fn button(id: &str, class: &str) -> Element {
    Element::new("button")
        .attr("type", "button")
        .id(id)
        .class(class)
}

fn hidden() -> Style {
    Style::new().set("display", "none")
}

fn logo(config: &BannerConfig) -> Option<Element> {
    let logo = &config.branding.logo;
    if !logo.enabled {
        return None;
    }
    let src = sanitize_url(&logo.url)?;
    Some(
        Element::new("div").class("cookie-banner__logo").child(
            Element::void("img")
                .attr("src", src)
                .attr("alt", "")
                .style(
                    &Style::new()
                        .set("max-width", format!("{}px", logo.max_width))
                        .set("max-height", format!("{}px", logo.max_height)),
                ),
        ),
    )
}

fn privacy_link(config: &BannerConfig) -> Option<Element> {
    let policy = &config.branding.privacy_policy;
    let href = sanitize_url(&policy.url)?;
    let text = if policy.text.trim().is_empty() {
        "Privacy Policy"
    } else {
        policy.text.as_str()
    };
    Some(
        Element::new("a")
            .class("cookie-banner__policy")
            .attr("href", href)
            .attr_if(policy.open_in_new_tab, "target", "_blank")
            .attr_if(policy.open_in_new_tab, "rel", "noopener noreferrer")
            .text(text),
    )
}

/// Main consent bar/card. Hidden until the runtime decides to show it.
pub fn banner_markup(config: &BannerConfig) -> Markup {
    let text = &config.text;
    let behavior = &config.behavior;

    let mut message = Element::new("p")
        .id(ids::BANNER_MESSAGE)
        .class("cookie-banner__message")
        .text(&text.message);
    if let Some(link) = privacy_link(config) {
        message = message.text(" ").child(link);
    }

    let content = Element::new("div")
        .class("cookie-banner__content")
        .child(
            Element::new("h2")
                .id(ids::BANNER_TITLE)
                .class("cookie-banner__title")
                .text(&text.title),
        )
        .child(message);

    let layout = behavior.button_layout.unwrap_or_default();
    let mut actions = Element::new("div").class(&format!(
        "cookie-banner__actions cookie-banner__actions--{}",
        layout.as_str()
    ));
    if behavior.show_preferences {
        actions = actions.child(
            button(ids::PREFERENCES, "cookie-btn cookie-btn--link").text(&text.preferences_button),
        );
    }
    if behavior.shows_reject_button() {
        actions = actions
            .child(button(ids::REJECT, "cookie-btn cookie-btn--secondary").text(&text.reject_button));
    }
    actions =
        actions.child(button(ids::ACCEPT, "cookie-btn cookie-btn--primary").text(&text.accept_button));

    let logo_position = match config.branding.logo.position {
        LogoPosition::Left => "left",
        LogoPosition::Center => "center",
        LogoPosition::Right => "right",
    };
    let inner = Element::new("div")
        .class(&format!(
            "cookie-banner__inner cookie-banner__inner--logo-{logo_position}"
        ))
        .child_opt(logo(config))
        .child(content)
        .child(actions);

    Element::new("div")
        .id(ids::BANNER)
        .class(&format!(
            "cookie-banner cookie-banner--{}",
            config.position.as_str()
        ))
        .attr("role", "dialog")
        .attr("aria-live", "polite")
        .attr("aria-labelledby", ids::BANNER_TITLE)
        .attr("aria-describedby", ids::BANNER_MESSAGE)
        .style(&hidden())
        .child(inner)
        .render()
}

fn toggle_row(locale: Locale, key: &str, title: I18nKey, description: I18nKey) -> Element {
    let input_id = format!("cookie-toggle-{key}");
    let title_id = format!("cookie-category-title-{key}");
    let control = Element::new("label")
        .class("cookie-toggle")
        .attr("for", &input_id)
        .child(
            Element::void("input")
                .attr("type", "checkbox")
                .id(&input_id)
                .class("cookie-toggle__input")
                .attr("data-consent", key)
                .attr("role", "switch")
                .attr("aria-checked", "false")
                .attr("aria-labelledby", &title_id),
        )
        .child(
            Element::new("span")
                .class("cookie-toggle__slider")
                .attr("aria-hidden", "true"),
        );

    Element::new("div")
        .class("cookie-category")
        .attr("data-category", key)
        .child(
            Element::new("div")
                .class("cookie-category__header")
                .child(
                    i18n("span", locale, title)
                        .id(&title_id)
                        .class("cookie-category__title"),
                )
                .child(control),
        )
        .child(i18n("p", locale, description).class("cookie-category__description"))
}

fn necessary_row(locale: Locale) -> Element {
    Element::new("div")
        .class("cookie-category cookie-category--locked")
        .attr("data-category", "necessary")
        .child(
            Element::new("div")
                .class("cookie-category__header")
                .child(i18n("span", locale, I18nKey::NecessaryTitle).class("cookie-category__title"))
                .child(
                    i18n("span", locale, I18nKey::AlwaysActive).class("cookie-category__always"),
                ),
        )
        .child(
            i18n("p", locale, I18nKey::NecessaryDescription).class("cookie-category__description"),
        )
}

/// Preferences modal; `None` when preferences are disabled.
pub fn preferences_modal_markup(config: &BannerConfig) -> Option<Markup> {
    if !config.behavior.show_preferences {
        return None;
    }
    let locale = Locale::for_render(config.language);

    let header = Element::new("div")
        .class("cookie-modal__header")
        .child(
            i18n("h2", locale, I18nKey::PreferencesTitle)
                .id(ids::MODAL_TITLE)
                .class("cookie-modal__title"),
        )
        .child(
            button(ids::MODAL_CLOSE, "cookie-modal__close")
                .attr("aria-label", locale.get(I18nKey::Close))
                .attr("data-cookie-i18n-label", I18nKey::Close.as_str())
                .text("×"),
        );

    let categories = Element::new("div")
        .class("cookie-modal__categories")
        .child(necessary_row(locale))
        .children(
            TOGGLE_ROWS
                .iter()
                .map(|(key, title, desc)| toggle_row(locale, key, *title, *desc)),
        );

    let footer = Element::new("div")
        .class("cookie-modal__footer")
        .child(
            button(ids::MODAL_SAVE, "cookie-btn cookie-btn--secondary")
                .attr("data-cookie-i18n", I18nKey::SavePreferences.as_str())
                .text(locale.get(I18nKey::SavePreferences)),
        )
        .child(
            button(ids::MODAL_ACCEPT_ALL, "cookie-btn cookie-btn--primary")
                .attr("data-cookie-i18n", I18nKey::AcceptAll.as_str())
                .text(locale.get(I18nKey::AcceptAll)),
        );

    Some(
        Element::new("div")
            .id(ids::MODAL)
            .class("cookie-modal")
            .attr("role", "dialog")
            .attr("aria-modal", "true")
            .attr("aria-labelledby", ids::MODAL_TITLE)
            .style(&hidden())
            .child(
                Element::new("div")
                    .class("cookie-modal__dialog")
                    .child(header)
                    .child(
                        i18n("p", locale, I18nKey::PreferencesIntro).class("cookie-modal__intro"),
                    )
                    .child(categories)
                    .child(footer),
            )
            .render(),
    )
}

/// Label shown by the floating button and inline link. Falls back to the
/// translatable built-in label when the configured text is blank.
fn settings_label(config: &BannerConfig, tag: &'static str, class: &str) -> Element {
    let text = config.branding.footer_link.text.trim();
    if text.is_empty() {
        i18n(tag, Locale::for_render(config.language), I18nKey::SettingsButton).class(class)
    } else {
        Element::new(tag).class(class).text(text)
    }
}

fn material_icon(name: &str, size: &str, class: &str) -> Element {
    Element::new("span")
        .class(&format!("material-symbols-outlined {class}"))
        .attr("aria-hidden", "true")
        .style(&Style::new().set("font-size", size))
        .text(name)
}

/// Inner content of the floating button.
///
/// Circles always render the icon alone; otherwise a configured logo replaces the
/// icon when `showLogo` is set, and the label follows when `showText` is set.
pub fn floating_button_content(config: &BannerConfig) -> Vec<Markup> {
    let footer = &config.branding.footer_link;
    let style = &footer.floating_style;
    let icon_size = styles::floating_icon_size(style.size);
    let icon = material_icon(&footer.icons().default, icon_size, "cookie-settings-icon");

    if style.shape == FloatingShape::Circle {
        return vec![icon.render()];
    }

    let logo_src = if style.show_logo && config.branding.logo.enabled {
        sanitize_url(&config.branding.logo.url)
    } else {
        None
    };
    let mut parts = vec![match logo_src {
        Some(src) => Element::void("img")
            .class("cookie-settings-logo")
            .attr("src", src)
            .attr("alt", "")
            .style(&Style::new().set("height", icon_size))
            .render(),
        None => icon.render(),
    }];
    if style.show_text {
        parts.push(settings_label(config, "span", "cookie-settings-text").render());
    }
    parts
}

/// Floating reopen button; `None` unless the footer link is enabled in a floating style.
pub fn floating_button_markup(config: &BannerConfig) -> Option<Markup> {
    let footer = &config.branding.footer_link;
    if !footer.enabled || !footer.style.has_floating() {
        return None;
    }
    let label = if footer.text.trim().is_empty() {
        Locale::for_render(config.language).get(I18nKey::SettingsButton)
    } else {
        footer.text.trim()
    };
    Some(
        button(
            ids::FLOATING,
            &format!(
                "cookie-settings-button cookie-settings-button--{}",
                footer.floating_style.shape.as_str()
            ),
        )
        .attr("aria-label", label)
        .style(&styles::floating_button_style(config))
        .children(floating_button_content(config))
        .render(),
    )
}

const SHOW_PREFERENCES_HANDLER: &str =
    "window.showCookiePreferences && window.showCookiePreferences(); return false;";

/// The copy-paste footer link itself (not wrapped in a comment).
///
/// This is the one place an inline handler is emitted: the snippet lives in the
/// site owner's markup with no guarantee about script order, so it calls the
/// global exposed by the runtime.
pub fn inline_link_element(config: &BannerConfig) -> Element {
    let footer = &config.branding.footer_link;
    let inline = &footer.inline_style;
    let colors = &config.colors;
    let link_color = inline.color.as_deref().unwrap_or(&colors.link);

    let anchor = || {
        Element::new("a")
            .attr("href", "#")
            .attr("onclick", SHOW_PREFERENCES_HANDLER)
    };

    match inline.link_type {
        InlineLinkType::Plain => anchor()
            .class("cookie-settings-link")
            .style(
                &Style::new()
                    .set("color", link_color)
                    .set("text-decoration", "underline")
                    .set("cursor", "pointer"),
            )
            .child(settings_label(config, "span", "cookie-settings-link__text")),
        InlineLinkType::Button => Element::new("button")
            .attr("type", "button")
            .class("cookie-settings-link cookie-settings-link_button")
            .attr("onclick", SHOW_PREFERENCES_HANDLER)
            .style(
                &Style::new()
                    .set("background", &colors.button)
                    .set("color", &colors.button_text)
                    .set("border", "none")
                    .set("padding", "8px 16px")
                    .set("border-radius", "6px")
                    .set("font-size", "14px")
                    .set("cursor", "pointer"),
            )
            .child(settings_label(config, "span", "cookie-settings-link__text")),
        InlineLinkType::IconText => anchor()
            .class("cookie-settings-link cookie-settings-link_icon")
            .style(
                &Style::new()
                    .set("color", link_color)
                    .set("display", "inline-flex")
                    .set("align-items", "center")
                    .set("gap", "6px")
                    .set("text-decoration", "none")
                    .set("cursor", "pointer"),
            )
            .child(material_icon(&footer.icons().default, "18px", "cookie-settings-link__icon"))
            .child(settings_label(config, "span", "cookie-settings-link__text")),
        InlineLinkType::Custom => {
            let class = format!("cookie-settings-link {}", inline.custom_class.trim());
            let logo_src = sanitize_url(&inline.custom_logo_url).unwrap_or("YOUR_LOGO_URL");
            anchor()
                .class(class.trim())
                .style(
                    &Style::new()
                        .set("display", "inline-flex")
                        .set("align-items", "center")
                        .set("gap", "8px"),
                )
                .child(
                    Element::void("img")
                        .class("cookie-settings-link__logo")
                        .attr("src", logo_src)
                        .attr("alt", "")
                        .style(&Style::new().set("height", "20px")),
                )
                .child(settings_label(config, "span", "cookie-settings-link__text"))
        }
    }
}

/// Ready-to-copy footer link wrapped in an HTML comment; `None` unless an inline
/// style is selected. `enabled` only governs the floating button.
pub fn inline_link_markup(config: &BannerConfig) -> Option<Markup> {
    let footer = &config.branding.footer_link;
    if !footer.style.has_inline() {
        return None;
    }
    let align = match footer.position {
        FooterLinkPosition::Left => "left",
        FooterLinkPosition::Center => "center",
        FooterLinkPosition::Right => "right",
    };
    let snippet = Element::new("div")
        .class("cookie-settings-footer")
        .style(&Style::new().set("text-align", align))
        .child(inline_link_element(config))
        .render();
    Some(Markup::comment(&Markup::join([
        Markup::text("Cookie settings link: paste this snippet into your site footer."),
        snippet,
    ])))
}

/// `<style>` block with the rules the banner needs before the stylesheet arrives.
pub fn critical_css_markup(config: &BannerConfig) -> Option<Markup> {
    if !config.advanced.performance.inline_critical_css {
        return None;
    }
    let css = format!(
        "#{} {{ {} }}\n#{}, #{} {{ display: none; }}",
        ids::BANNER,
        styles::banner_style(config).to_css(),
        ids::MODAL,
        ids::FLOATING
    );
    Some(
        Element::new("style")
            .id(ids::CRITICAL_CSS)
            .child(Markup::trusted(css))
            .render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FooterLinkStyle, Language};
    use pretty_assertions::assert_eq;

    fn html(m: &Markup) -> &str {
        m.as_str()
    }

    #[test]
    fn banner_escapes_user_text_and_is_hidden() {
        let mut cfg = BannerConfig::default();
        cfg.text.title = "<img src=x onerror=alert(1)>".into();
        cfg.text.accept_button = "OK & \"go\"".into();
        let out = banner_markup(&cfg);
        assert!(html(&out).starts_with("<div id=\"cookie-banner\""));
        assert!(html(&out).contains("style=\"display: none;\""));
        assert!(html(&out).contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(html(&out).contains("OK &amp; &quot;go&quot;"));
        assert!(!html(&out).contains("<img src=x"));
    }

    #[test]
    fn reject_and_preferences_buttons_follow_behavior() {
        let mut cfg = BannerConfig::default();
        assert!(html(&banner_markup(&cfg)).contains("id=\"cookie-reject\""));
        assert!(html(&banner_markup(&cfg)).contains("id=\"cookie-preferences\""));

        cfg.behavior.show_reject_button = Some(false);
        cfg.behavior.show_preferences = false;
        let out = banner_markup(&cfg);
        assert!(!html(&out).contains("id=\"cookie-reject\""));
        assert!(!html(&out).contains("id=\"cookie-preferences\""));
        assert!(html(&out).contains("id=\"cookie-accept\""));
        assert!(preferences_modal_markup(&cfg).is_none());
    }

    #[test]
    fn privacy_link_requires_safe_url() {
        let mut cfg = BannerConfig::default();
        cfg.branding.privacy_policy.url = "javascript:alert(1)".into();
        assert!(!html(&banner_markup(&cfg)).contains("cookie-banner__policy"));

        cfg.branding.privacy_policy.url = "https://example.com/privacy?a=1&b=2".into();
        let out = banner_markup(&cfg);
        assert!(html(&out).contains("href=\"https://example.com/privacy?a=1&amp;b=2\""));
        assert!(html(&out).contains("target=\"_blank\" rel=\"noopener noreferrer\""));
    }

    #[test]
    fn logo_is_rendered_with_dimensions() {
        let mut cfg = BannerConfig::default();
        cfg.branding.logo.enabled = true;
        cfg.branding.logo.url = "https://example.com/logo.png".into();
        cfg.branding.logo.position = LogoPosition::Right;
        let out = banner_markup(&cfg);
        assert!(html(&out).contains("cookie-banner__inner--logo-right"));
        assert!(html(&out).contains("max-width: 120px; max-height: 40px;"));
    }

    #[test]
    fn modal_has_five_rows_and_four_toggles() {
        let cfg = BannerConfig::default();
        let out = preferences_modal_markup(&cfg).unwrap();
        assert_eq!(html(&out).matches("data-category=").count(), 5);
        assert_eq!(html(&out).matches("type=\"checkbox\"").count(), 4);
        assert!(!html(&out).contains(" checked"));
        for key in toggle_keys() {
            assert!(html(&out).contains(&format!("id=\"cookie-toggle-{key}\"")));
        }
    }

    #[test]
    fn modal_renders_in_fixed_language() {
        let mut cfg = BannerConfig::default();
        cfg.language = Language::Fr;
        let out = preferences_modal_markup(&cfg).unwrap();
        assert!(html(&out).contains("Tout accepter"));
    }

    #[test]
    fn floating_button_only_for_floating_styles() {
        let mut cfg = BannerConfig::default();
        assert!(floating_button_markup(&cfg).is_some());
        cfg.branding.footer_link.style = FooterLinkStyle::Inline;
        assert!(floating_button_markup(&cfg).is_none());
        cfg.branding.footer_link.style = FooterLinkStyle::Both;
        cfg.branding.footer_link.enabled = false;
        assert!(floating_button_markup(&cfg).is_none());
    }

    #[test]
    fn inline_link_follows_style_only() {
        let mut cfg = BannerConfig::default();
        assert!(inline_link_markup(&cfg).is_none());
        cfg.branding.footer_link.style = FooterLinkStyle::Both;
        cfg.branding.footer_link.enabled = false;
        assert!(inline_link_markup(&cfg).is_some());
        assert!(floating_button_markup(&cfg).is_none());
    }

    #[test]
    fn circle_shows_icon_only() {
        let mut cfg = BannerConfig::default();
        cfg.branding.footer_link.floating_style.shape = FloatingShape::Circle;
        cfg.branding.footer_link.floating_style.show_text = true;
        let parts = floating_button_content(&cfg);
        assert_eq!(parts.len(), 1);
        assert!(parts[0].as_str().contains("material-symbols-outlined"));
    }

    #[test]
    fn pill_shows_logo_and_text_when_configured() {
        let mut cfg = BannerConfig::default();
        cfg.branding.logo.enabled = true;
        cfg.branding.logo.url = "/logo.svg".into();
        cfg.branding.footer_link.floating_style.show_logo = true;
        let parts = floating_button_content(&cfg);
        assert_eq!(parts.len(), 2);
        assert!(parts[0].as_str().starts_with("<img class=\"cookie-settings-logo\""));
        assert!(parts[1].as_str().contains("Cookie Settings"));
    }

    #[test]
    fn inline_button_link_uses_button_colors() {
        let mut cfg = BannerConfig::default();
        cfg.branding.footer_link.style = FooterLinkStyle::Inline;
        cfg.branding.footer_link.inline_style.link_type = InlineLinkType::Button;
        cfg.branding.footer_link.text = "Manage <cookies>".into();
        cfg.colors.button = "#ff0000".into();
        cfg.colors.button_text = "#00ff00".into();

        let el = inline_link_element(&cfg).render();
        assert!(html(&el).starts_with("<button"));
        assert!(html(&el).contains("Manage &lt;cookies&gt;"));
        assert!(html(&el).contains("background: #ff0000;"));
        assert!(html(&el).contains("color: #00ff00;"));
        assert!(html(&el).contains(
            "onclick=\"window.showCookiePreferences &amp;&amp; window.showCookiePreferences(); return false;\""
        ));

        let comment = inline_link_markup(&cfg).unwrap();
        assert!(html(&comment).starts_with("<!--"));
        assert!(html(&comment).ends_with("-->"));
    }

    #[test]
    fn inline_templates_differ_per_type() {
        let mut cfg = BannerConfig::default();
        cfg.branding.footer_link.style = FooterLinkStyle::Both;
        cfg.branding.footer_link.inline_style.link_type = InlineLinkType::Custom;
        cfg.branding.footer_link.inline_style.custom_class = "my-link\" onmouseover=\"x".into();
        let custom = inline_link_element(&cfg).render();
        assert!(html(&custom).contains("YOUR_LOGO_URL"));
        assert!(html(&custom).contains("my-link&quot; onmouseover=&quot;x"));

        cfg.branding.footer_link.inline_style.link_type = InlineLinkType::IconText;
        assert!(html(&inline_link_element(&cfg).render()).contains("material-symbols-outlined"));

        cfg.branding.footer_link.inline_style.link_type = InlineLinkType::Plain;
        assert!(html(&inline_link_element(&cfg).render()).starts_with("<a href=\"#\""));
    }

    #[test]
    fn inline_comment_cannot_be_terminated_early() {
        let mut cfg = BannerConfig::default();
        cfg.branding.footer_link.style = FooterLinkStyle::Inline;
        cfg.branding.footer_link.text = "--> <script>alert(1)</script>".into();
        let comment = inline_link_markup(&cfg).unwrap();
        let body = &html(&comment)[4..html(&comment).len() - 3];
        assert!(!body.contains("-->"));
        assert!(!body.contains("<script"));
    }

    #[test]
    fn critical_css_only_when_enabled() {
        let mut cfg = BannerConfig::default();
        assert!(critical_css_markup(&cfg).is_none());
        cfg.advanced.performance.inline_critical_css = true;
        let css = critical_css_markup(&cfg).unwrap();
        assert!(html(&css).contains("#cookie-banner { position: fixed;"));
    }
}
