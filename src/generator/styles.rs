//! Pure mappings from configuration enums to CSS declarations.

use crate::config::{
    Animation, BannerConfig, BannerPosition, BorderRadius, FloatingPosition, FloatingShape,
    FloatingSize, Layout, LayoutWidth, Margin, Shadow, Spacing, Theme,
};
use crate::utils::color::{parse_color, with_alpha};
use crate::utils::markup::Style;

/// Names of the keyframes defined once in the stylesheet.
pub const KEYFRAMES: [&str; 4] = ["cookieFadeIn", "cookieSlideIn", "cookieBounceIn", "cookiePulse"];

/// Fallback width for `custom` layouts with no usable pixel value.
const DEFAULT_CUSTOM_WIDTH: u32 = 480;

/// Offsets (and centering transform) for the main banner.
pub fn position_style(position: BannerPosition) -> Style {
    let s = Style::new();
    match position {
        BannerPosition::Top => s
            .set("top", "0")
            .set("left", "0")
            .set("right", "0")
            .set("--cookie-slide-y", "-24px"),
        BannerPosition::Bottom => s
            .set("bottom", "0")
            .set("left", "0")
            .set("right", "0")
            .set("--cookie-slide-y", "24px"),
        BannerPosition::FloatingBottomRight => s
            .set("bottom", "20px")
            .set("right", "20px")
            .set("--cookie-slide-y", "24px"),
        BannerPosition::FloatingBottomLeft => s
            .set("bottom", "20px")
            .set("left", "20px")
            .set("--cookie-slide-y", "24px"),
        BannerPosition::FloatingTopRight => s
            .set("top", "20px")
            .set("right", "20px")
            .set("--cookie-slide-y", "-24px"),
        BannerPosition::FloatingTopLeft => s
            .set("top", "20px")
            .set("left", "20px")
            .set("--cookie-slide-y", "-24px"),
        BannerPosition::ModalCenter => s
            .set("top", "50%")
            .set("left", "50%")
            .set("transform", "translate(-50%, -50%)")
            .set("--cookie-slide-y", "24px"),
        BannerPosition::ModalBottom => s
            .set("bottom", "20px")
            .set("left", "50%")
            .set("transform", "translateX(-50%)")
            .set("--cookie-slide-y", "24px"),
        BannerPosition::ModalTop => s
            .set("top", "20px")
            .set("left", "50%")
            .set("transform", "translateX(-50%)")
            .set("--cookie-slide-y", "-24px"),
        BannerPosition::SlideInRight => s
            .set("top", "50%")
            .set("right", "20px")
            .set("transform", "translateY(-50%)")
            .set("--cookie-slide-x", "48px")
            .set("--cookie-slide-y", "0"),
        BannerPosition::SlideInLeft => s
            .set("top", "50%")
            .set("left", "20px")
            .set("transform", "translateY(-50%)")
            .set("--cookie-slide-x", "-48px")
            .set("--cookie-slide-y", "0"),
        BannerPosition::SlideInTop => s
            .set("top", "0")
            .set("left", "50%")
            .set("transform", "translateX(-50%)")
            .set("--cookie-slide-y", "-48px"),
        BannerPosition::SlideInBottom => s
            .set("bottom", "0")
            .set("left", "50%")
            .set("transform", "translateX(-50%)")
            .set("--cookie-slide-y", "48px"),
    }
}

/// `width` / `max-width` for the banner box.
pub fn width_style(layout: &Layout, position: BannerPosition) -> Style {
    let width = match layout.width {
        LayoutWidth::Full if position.is_bar() => "100%".to_string(),
        LayoutWidth::Full => "calc(100vw - 40px)".to_string(),
        LayoutWidth::Auto => "auto".to_string(),
        LayoutWidth::Small => "360px".to_string(),
        LayoutWidth::Medium => "480px".to_string(),
        LayoutWidth::Large => "640px".to_string(),
        LayoutWidth::Custom => {
            let px = layout
                .custom_width
                .filter(|w| *w > 0)
                .unwrap_or(DEFAULT_CUSTOM_WIDTH);
            format!("{px}px")
        }
    };
    let max_width = match (layout.max_width.filter(|w| *w > 0), position.is_bar()) {
        (Some(px), _) => format!("min({px}px, 100vw)"),
        (None, true) => "100vw".to_string(),
        (None, false) => "calc(100vw - 40px)".to_string(),
    };
    Style::new()
        .set("width", width)
        .set("max-width", max_width)
        .set("box-sizing", "border-box")
}

pub fn border_radius_value(radius: BorderRadius) -> &'static str {
    match radius {
        BorderRadius::None => "0",
        BorderRadius::Small => "4px",
        BorderRadius::Medium => "8px",
        BorderRadius::Large => "16px",
        BorderRadius::Full => "24px",
    }
}

pub fn padding_value(padding: Spacing) -> &'static str {
    match padding {
        Spacing::Compact => "12px 16px",
        Spacing::Normal => "20px 24px",
        Spacing::Spacious => "28px 32px",
    }
}

pub fn margin_value(margin: Margin) -> &'static str {
    match margin {
        Margin::None => "0",
        Margin::Small => "8px",
        Margin::Medium => "16px",
        Margin::Large => "24px",
    }
}

pub fn shadow_value(shadow: Shadow) -> &'static str {
    match shadow {
        Shadow::None => "none",
        Shadow::Small => "0 1px 3px rgba(0, 0, 0, 0.12), 0 1px 2px rgba(0, 0, 0, 0.08)",
        Shadow::Medium => "0 4px 12px rgba(0, 0, 0, 0.15)",
        Shadow::Large => "0 10px 40px rgba(0, 0, 0, 0.2)",
    }
}

/// `animation` shorthand referencing one of [`KEYFRAMES`].
pub fn animation_value(animation: Animation) -> &'static str {
    match animation {
        Animation::None => "none",
        Animation::Fade => "cookieFadeIn 0.4s ease-out",
        Animation::Slide => "cookieSlideIn 0.45s cubic-bezier(0.16, 1, 0.3, 1)",
        Animation::Bounce => "cookieBounceIn 0.6s ease-out",
        Animation::Pulse => "cookieFadeIn 0.3s ease-out, cookiePulse 1.2s ease-in-out 0.3s 2",
    }
}

/// Box model, shadow and animation for the banner.
pub fn layout_style(layout: &Layout, position: BannerPosition) -> Style {
    width_style(layout, position)
        .set("border-radius", border_radius_value(layout.border_radius))
        .set("padding", padding_value(layout.padding))
        .set("margin", margin_value(layout.margin))
        .set("box-shadow", shadow_value(layout.shadow))
        .set("animation", animation_value(layout.animation))
}

/// Whether derived colors should use the dark-theme variants.
pub fn is_dark(config: &BannerConfig) -> bool {
    match config.theme {
        Theme::Dark => true,
        Theme::Light => false,
        Theme::Custom => parse_color(&config.colors.background).is_some_and(|c| c.is_dark()),
    }
}

/// Hairline separator color: translucent white on dark themes, black otherwise.
pub fn border_color(config: &BannerConfig) -> &'static str {
    if is_dark(config) {
        "rgba(255, 255, 255, 0.1)"
    } else {
        "rgba(0, 0, 0, 0.1)"
    }
}

/// Muted variant of `colors.text` for descriptions.
pub fn secondary_text_color(config: &BannerConfig) -> String {
    let alpha = if is_dark(config) { 0.7 } else { 0.6 };
    with_alpha(&config.colors.text, alpha)
}

/// Background of the category cards in the preferences modal.
pub fn card_background_color(config: &BannerConfig) -> String {
    if is_dark(config) {
        with_alpha(&config.colors.background, 0.3)
    } else {
        "rgba(0, 0, 0, 0.03)".to_string()
    }
}

/// Everything the `#cookie-banner` rule needs besides `display`.
pub fn banner_style(config: &BannerConfig) -> Style {
    Style::new()
        .set("position", "fixed")
        .set("z-index", "2147483000")
        .extend(position_style(config.position))
        .extend(layout_style(&config.layout, config.position))
        .set("background", &config.colors.background)
        .set("color", &config.colors.text)
        .set("border", format!("1px solid {}", border_color(config)))
}

struct FloatingDims {
    height: u32,
    padding: &'static str,
    font_size: &'static str,
    icon_size: &'static str,
}

fn floating_dims(size: FloatingSize) -> FloatingDims {
    match size {
        FloatingSize::Small => FloatingDims {
            height: 40,
            padding: "0 14px",
            font_size: "13px",
            icon_size: "18px",
        },
        FloatingSize::Medium => FloatingDims {
            height: 48,
            padding: "0 18px",
            font_size: "14px",
            icon_size: "22px",
        },
        FloatingSize::Large => FloatingDims {
            height: 56,
            padding: "0 22px",
            font_size: "15px",
            icon_size: "26px",
        },
    }
}

pub fn floating_position_style(position: FloatingPosition) -> Style {
    let s = Style::new();
    match position {
        FloatingPosition::BottomRight => s.set("bottom", "20px").set("right", "20px"),
        FloatingPosition::BottomLeft => s.set("bottom", "20px").set("left", "20px"),
        FloatingPosition::TopRight => s.set("top", "20px").set("right", "20px"),
        FloatingPosition::TopLeft => s.set("top", "20px").set("left", "20px"),
    }
}

/// Icon glyph size for the floating button.
pub fn floating_icon_size(size: FloatingSize) -> &'static str {
    floating_dims(size).icon_size
}

/// Inline style of the floating settings button: shape, size, colors, anchor.
pub fn floating_button_style(config: &BannerConfig) -> Style {
    let footer = &config.branding.footer_link;
    let style = &footer.floating_style;
    let dims = floating_dims(style.size);
    let background = style
        .background_color
        .as_deref()
        .unwrap_or(&config.colors.button);
    let color = style
        .text_color
        .as_deref()
        .unwrap_or(&config.colors.button_text);

    let shape = match style.shape {
        FloatingShape::Circle => Style::new()
            .set("width", format!("{}px", dims.height))
            .set("padding", "0")
            .set("border-radius", "50%")
            .set("justify-content", "center"),
        FloatingShape::Pill => Style::new()
            .set("padding", dims.padding)
            .set("border-radius", "999px"),
        FloatingShape::Square => Style::new()
            .set("padding", dims.padding)
            .set("border-radius", "8px"),
    };

    Style::new()
        .set("display", "none")
        .set("position", "fixed")
        .set("z-index", "2147482999")
        .extend(floating_position_style(footer.floating_position))
        .set("height", format!("{}px", dims.height))
        .set("font-size", dims.font_size)
        .set("background", background)
        .set("color", color)
        .extend(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_valid(style: &Style) {
        let css = style.to_css();
        assert!(!css.is_empty());
        assert!(!css.contains("undefined"));
        for decl in css.split(';').map(str::trim).filter(|d| !d.is_empty()) {
            let (prop, value) = decl.split_once(':').expect("declaration has a colon");
            assert!(!prop.trim().is_empty(), "empty property in {css}");
            assert!(!value.trim().is_empty(), "empty value in {css}");
        }
    }

    #[test]
    fn every_position_has_offsets() {
        for position in BannerPosition::ALL {
            let style = position_style(*position);
            assert_valid(&style);
            assert!(style.get("top").is_some() || style.get("bottom").is_some());
        }
    }

    #[test]
    fn every_shadow_and_animation_is_valid() {
        for shadow in Shadow::ALL {
            let layout = Layout {
                shadow: *shadow,
                ..Layout::default()
            };
            assert_valid(&layout_style(&layout, BannerPosition::Bottom));
        }
        for animation in Animation::ALL {
            let layout = Layout {
                animation: *animation,
                ..Layout::default()
            };
            let style = layout_style(&layout, BannerPosition::ModalCenter);
            assert_valid(&style);
            let value = style.get("animation").unwrap();
            assert!(value == "none" || KEYFRAMES.iter().any(|k| value.contains(k)));
        }
    }

    #[test]
    fn custom_width_uses_pixels_and_falls_back() {
        let layout = Layout {
            width: LayoutWidth::Custom,
            custom_width: Some(420),
            ..Layout::default()
        };
        assert_eq!(
            width_style(&layout, BannerPosition::Bottom).get("width"),
            Some("420px")
        );
        let missing = Layout {
            width: LayoutWidth::Custom,
            custom_width: None,
            ..Layout::default()
        };
        assert_eq!(
            width_style(&missing, BannerPosition::Bottom).get("width"),
            Some("480px")
        );
    }

    #[test]
    fn derived_colors_match_for_hex_and_rgb() {
        let mut hex = BannerConfig::default();
        hex.theme = Theme::Dark;
        hex.colors.text = "#e5e7eb".into();
        hex.colors.background = "#111827".into();
        let mut rgb = hex.clone();
        rgb.colors.text = "rgb(229, 231, 235)".into();
        rgb.colors.background = "rgb(17, 24, 39)".into();

        assert_eq!(secondary_text_color(&hex), secondary_text_color(&rgb));
        assert_eq!(secondary_text_color(&hex), "rgba(229, 231, 235, 0.7)");
        assert_eq!(card_background_color(&hex), card_background_color(&rgb));
        assert_eq!(card_background_color(&hex), "rgba(17, 24, 39, 0.3)");
    }

    #[test]
    fn light_theme_colors() {
        let cfg = BannerConfig::default();
        assert_eq!(border_color(&cfg), "rgba(0, 0, 0, 0.1)");
        assert_eq!(secondary_text_color(&cfg), "rgba(31, 41, 55, 0.6)");
        assert_eq!(card_background_color(&cfg), "rgba(0, 0, 0, 0.03)");
    }

    #[test]
    fn custom_theme_follows_background_luminance() {
        let mut cfg = BannerConfig::default();
        cfg.theme = Theme::Custom;
        cfg.colors.background = "#0b1020".into();
        assert_eq!(border_color(&cfg), "rgba(255, 255, 255, 0.1)");
        cfg.colors.background = "not-a-color".into();
        assert_eq!(border_color(&cfg), "rgba(0, 0, 0, 0.1)");
    }

    #[test]
    fn unparseable_text_color_passes_through() {
        let mut cfg = BannerConfig::default();
        cfg.colors.text = "black".into();
        assert_eq!(secondary_text_color(&cfg), "black");
    }

    #[test]
    fn floating_shapes_and_sizes() {
        let mut cfg = BannerConfig::default();
        for shape in FloatingShape::ALL {
            for size in FloatingSize::ALL {
                cfg.branding.footer_link.floating_style.shape = *shape;
                cfg.branding.footer_link.floating_style.size = *size;
                let style = floating_button_style(&cfg);
                assert_valid(&style);
                if *shape == FloatingShape::Circle {
                    assert_eq!(style.get("border-radius"), Some("50%"));
                    assert_eq!(style.get("width"), style.get("height"));
                }
            }
        }
        assert_eq!(floating_button_style(&cfg).get("background"), Some("#2563eb"));
    }
}
