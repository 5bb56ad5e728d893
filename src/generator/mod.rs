//! Banner code generation: config in, embeddable HTML/CSS/JS out.
//!
//! All generators are pure and infallible. Unusual but structurally valid
//! configs fall back to defaults instead of failing.

pub mod i18n;
pub mod markup;
pub mod runtime_js;
pub mod scripts;
pub mod styles;

use serde::Serialize;
use tracing::info;

use crate::config::{BannerConfig, Language};
use crate::utils::escape::escape_html;
use crate::utils::markup::Markup;
use crate::utils::template::{Fragment, Template};

pub use runtime_js::{CONSENT_COOKIE, consent_init_script, generate_runtime_script};
pub use scripts::{LoadPlan, generate_script_loaders};

const STYLESHEET_TEMPLATE: &str = include_str!("templates/banner.css");

/// The four artifacts of one banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerArtifacts {
    pub html: String,
    pub css: String,
    pub js: String,
    pub consent_init: String,
}

/// Banner, preferences modal, floating button and the inline-link comment, in that order.
pub fn generate_banner_html(config: &BannerConfig) -> String {
    Markup::join([
        markup::critical_css_markup(config).unwrap_or_default(),
        markup::banner_markup(config),
        markup::preferences_modal_markup(config).unwrap_or_default(),
        markup::floating_button_markup(config).unwrap_or_default(),
        markup::inline_link_markup(config).unwrap_or_default(),
    ])
    .into_string()
}

/// Fixed stylesheet themed by `config`, followed by `advanced.customCSS` verbatim.
pub fn generate_banner_css(config: &BannerConfig) -> String {
    let colors = &config.colors;
    let mut css = Template::new("banner.css", STYLESHEET_TEMPLATE)
        .set(
            "banner_rules",
            Fragment::trusted(styles::banner_style(config).to_block("  ")),
        )
        .set("background", Fragment::css(&colors.background))
        .set("text", Fragment::css(&colors.text))
        .set("button", Fragment::css(&colors.button))
        .set("button_text", Fragment::css(&colors.button_text))
        .set("link", Fragment::css(&colors.link))
        .set("border", Fragment::css(styles::border_color(config)))
        .set(
            "secondary_text",
            Fragment::css(&styles::secondary_text_color(config)),
        )
        .set(
            "card_background",
            Fragment::css(&styles::card_background_color(config)),
        )
        .render();

    let custom = config.advanced.custom_css.trim();
    if !custom.is_empty() {
        css.push_str("\n/* Custom CSS */\n");
        css.push_str(custom);
        css.push('\n');
    }
    css
}

/// The consent runtime IIFE.
///
/// `advanced.customJS` is deliberately not part of this artifact.
pub fn generate_banner_js(config: &BannerConfig) -> String {
    generate_runtime_script(config)
}

/// Script to place first in `<head>`; identical for every config.
pub fn generate_consent_init_script() -> String {
    consent_init_script().to_string()
}

/// Generate every artifact at once.
pub fn generate_all(config: &BannerConfig) -> BannerArtifacts {
    let artifacts = BannerArtifacts {
        html: generate_banner_html(config),
        css: generate_banner_css(config),
        js: generate_banner_js(config),
        consent_init: generate_consent_init_script(),
    };
    info!(
        target: "bannergen::generator",
        banner = %config.name,
        html_bytes = artifacts.html.len(),
        css_bytes = artifacts.css.len(),
        js_bytes = artifacts.js.len(),
        "Generated banner artifacts"
    );
    artifacts
}

/// `</` inside raw-text elements would end them early; `<\/` is equivalent in
/// both CSS and JS.
fn raw_text(content: &str) -> String {
    content.replace("</", "<\\/")
}

/// Standalone HTML document embedding all artifacts, for previewing a banner locally.
pub fn generate_preview_page(config: &BannerConfig, artifacts: &BannerArtifacts) -> String {
    let title = if config.name.trim().is_empty() {
        "Cookie banner preview".to_string()
    } else {
        format!("{} preview", config.name.trim())
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1" />
<title>{title}</title>
<script>
{init}
</script>
<style>
{css}
</style>
</head>
<body>
<main style="max-width: 720px; margin: 40px auto; padding: 0 16px; font-family: sans-serif; min-height: 200vh;">
<h1>{title}</h1>
<p>Clear the <code>{cookie}</code> cookie to see the banner again.</p>
</main>
{html}
<script>
{js}
</script>
</body>
</html>
"#,
        lang = match config.language {
            Language::Fr => "fr",
            Language::En | Language::Auto => "en",
        },
        title = escape_html(&title),
        init = raw_text(&artifacts.consent_init),
        css = raw_text(&artifacts.css),
        cookie = CONSENT_COOKIE,
        html = artifacts.html,
        js = raw_text(&artifacts.js),
    )
}
