//! Minimal CSS color parsing for derived (alpha-blended) colors.

/// An opaque sRGB color.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `rgba(r, g, b, alpha)`.
    pub fn rgba(self, alpha: f32) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }

    /// WCAG relative luminance in `[0, 1]`.
    pub fn relative_luminance(self) -> f64 {
        fn channel(c: u8) -> f64 {
            let c = f64::from(c) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }

    pub fn is_dark(self) -> bool {
        self.relative_luminance() < 0.5
    }
}

/// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(...)` or `rgba(...)`.
///
/// Any alpha channel is ignored. Returns `None` for anything else (named colors,
/// `hsl()`, garbage).
pub fn parse_color(input: &str) -> Option<Rgb> {
    let s = input.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = s.to_ascii_lowercase();
    let args = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    parse_rgb_args(args)
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok();
    let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 | 4 => Some(Rgb::new(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
        6 | 8 => Some(Rgb::new(pair(0)?, pair(2)?, pair(4)?)),
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<Rgb> {
    let mut parts = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty());
    let mut channel = || -> Option<u8> {
        let raw = parts.next()?;
        let value = match raw.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok()? * 2.55,
            None => raw.parse::<f32>().ok()?,
        };
        Some(value.round().clamp(0.0, 255.0) as u8)
    };
    Some(Rgb::new(channel()?, channel()?, channel()?))
}

/// Re-emit `color` with the given alpha, or return it unchanged if it cannot be parsed.
pub fn with_alpha(color: &str, alpha: f32) -> String {
    match parse_color(color) {
        Some(rgb) => rgb.rgba(alpha),
        None => color.to_owned(),
    }
}
