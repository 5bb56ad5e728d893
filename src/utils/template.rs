use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Display;
use tracing::warn;

use super::escape::{escape_html, js_string, json_for_script, sanitize_css_value};
use super::markup::Markup;

/// A value ready to be spliced into a template, already encoded for its target context.
///
/// The constructors are the only way to build one, so every slot value has gone
/// through the escaping appropriate to where it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment(String);

impl Fragment {
    /// HTML text or attribute value.
    pub fn html(s: &str) -> Self {
        Self(escape_html(s))
    }

    /// JavaScript string literal, quotes included.
    pub fn js_str(s: &str) -> Self {
        Self(js_string(s))
    }

    /// JavaScript expression holding the JSON form of `value`.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        Self(json_for_script(value))
    }

    /// JavaScript boolean literal.
    pub fn bool(value: bool) -> Self {
        Self(value.to_string())
    }

    /// Integer literal, valid in both CSS and JS.
    pub fn int<N: Into<i64>>(value: N) -> Self {
        Self(value.into().to_string())
    }

    /// CSS declaration value.
    pub fn css(value: &str) -> Self {
        Self(sanitize_css_value(value))
    }

    /// Pre-rendered safe HTML.
    pub fn markup(markup: &Markup) -> Self {
        Self(markup.as_str().to_owned())
    }

    /// Code produced by the generator itself.
    pub(crate) fn trusted(code: impl Display) -> Self {
        Self(code.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A text template with `{{ slot }}` placeholders.
///
/// Whitespace inside the braces is ignored: `{{  name  }}` == `{{name}}`.
/// A placeholder without a value renders as nothing and is reported with `warn!`
/// so a missing slot can never leak template syntax into generated code.
#[derive(Debug, Clone)]
pub struct Template<'a> {
    name: &'static str,
    source: &'a str,
    slots: HashMap<&'static str, Fragment>,
}

impl<'a> Template<'a> {
    pub fn new(name: &'static str, source: &'a str) -> Self {
        Self {
            name,
            source,
            slots: HashMap::new(),
        }
    }

    pub fn set(mut self, slot: &'static str, value: Fragment) -> Self {
        self.slots.insert(slot, value);
        self
    }

    pub fn render(&self) -> String {
        let template = self.source;
        let mut out = String::with_capacity(template.len());
        let mut idx = 0;
        let bytes = template.as_bytes();

        while let Some(start) = find_subslice(bytes, b"{{", idx) {
            out.push_str(&template[idx..start]);

            let content_start = start + 2;
            if let Some(end) = find_subslice(bytes, b"}}", content_start) {
                let token = template[content_start..end].trim();
                match self.slots.get(token) {
                    Some(fragment) => out.push_str(fragment.as_str()),
                    None => {
                        warn!(
                            target: "bannergen::generator",
                            template = self.name,
                            slot = %token,
                            "Template slot has no value; rendering it empty"
                        );
                    }
                }
                idx = end + 2;
            } else {
                // No closing delimiter: emit the rest verbatim.
                out.push_str(&template[start..]);
                idx = template.len();
                break;
            }
        }

        if idx < template.len() {
            out.push_str(&template[idx..]);
        }

        out
    }
}

/// Find the first occurrence of `needle` in `haystack` starting at `from`.
fn find_subslice(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| from + pos)
}

/// Names of every `{{ slot }}` appearing in `source`, in order of first appearance.
pub fn slot_names(source: &str) -> Vec<&str> {
    let bytes = source.as_bytes();
    let mut names = Vec::new();
    let mut idx = 0;
    while let Some(start) = find_subslice(bytes, b"{{", idx) {
        let Some(end) = find_subslice(bytes, b"}}", start + 2) else {
            break;
        };
        let name = source[start + 2..end].trim();
        if !names.contains(&name) {
            names.push(name);
        }
        idx = end + 2;
    }
    names
}
