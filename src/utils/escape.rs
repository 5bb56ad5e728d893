//! Escaping and encoding for every context the generator writes user data into.
//!
//! | Context                         | Helper                |
//! |---------------------------------|-----------------------|
//! | HTML text / attribute value     | [`escape_html`]       |
//! | HTML comment body               | [`escape_comment`]    |
//! | JS string literal / JSON blob   | [`js_string`], [`json_for_script`] |
//! | CSS declaration value           | [`sanitize_css_value`] |
//! | pasted tracking code            | [`encode_script_code`] |
//! | link / image URL                | [`sanitize_url`]      |

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;
use tracing::error;

/// Replace `&`, `<`, `>`, `"` and `'` with their entity equivalents.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Make already-escaped markup safe to wrap in `<!-- ... -->`.
///
/// `--` may not appear inside a comment; the entity form survives a copy-paste
/// back into a document because attribute values and text decode it.
pub fn escape_comment(s: &str) -> String {
    s.replace("--", "&#45;&#45;")
}

/// Remove HTML comment delimiters and `<script>`/`</script>` tags from a pasted snippet.
///
/// Matching is ASCII case-insensitive. Attributes on an opening `<script ...>` tag are
/// dropped together with the tag.
pub fn strip_script_wrappers(code: &str) -> String {
    // ASCII lowercasing keeps byte offsets identical to `code`.
    let lower = code.to_ascii_lowercase();
    let mut out = String::with_capacity(code.len());
    let mut i = 0;

    while i < code.len() {
        let rest = &lower[i..];
        if rest.starts_with("<!--") {
            i += 4;
        } else if rest.starts_with("-->") {
            i += 3;
        } else if rest.starts_with("</script") || is_script_open_tag(rest) {
            i = match rest.find('>') {
                Some(end) => i + end + 1,
                None => code.len(),
            };
        } else {
            let Some(ch) = code[i..].chars().next() else {
                break;
            };
            out.push(ch);
            i += ch.len_utf8();
        }
    }

    out
}

fn is_script_open_tag(lower_rest: &str) -> bool {
    lower_rest
        .strip_prefix("<script")
        .is_some_and(|after| {
            after
                .chars()
                .next()
                .is_none_or(|c| c.is_ascii_whitespace() || c == '>' || c == '/')
        })
}

/// Strip wrappers from a pasted snippet and base64-encode what remains.
///
/// Whitespace-only input (after stripping) yields an empty string, which callers
/// treat as an unconfigured script.
pub fn encode_script_code(code: &str) -> String {
    let stripped = strip_script_wrappers(code);
    let body = stripped.trim();
    if body.is_empty() {
        return String::new();
    }
    STANDARD.encode(body.as_bytes())
}

/// Render `s` as a double-quoted JavaScript string literal that is also safe
/// inside an inline `<script>` element.
pub fn js_string(s: &str) -> String {
    harden_for_script(serde_json::Value::String(s.to_owned()).to_string())
}

/// Serialize `value` as JSON usable as a JavaScript expression inside `<script>`.
///
/// Falls back to `null` (and logs) if serialization fails, which cannot happen for
/// the plain data structures the generator embeds.
pub fn json_for_script<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => harden_for_script(json),
        Err(err) => {
            error!(target: "bannergen::generator", error = %err, "Failed to serialize runtime data");
            "null".into()
        }
    }
}

/// `<`, `>` and `&` can only occur inside JSON strings, where the `\uXXXX` forms are
/// equivalent. U+2028/U+2029 are line terminators in older JS engines.
fn harden_for_script(json: String) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

/// Reduce a user-supplied CSS value to characters that cannot end a declaration,
/// open a block, or close the surrounding `<style>`/attribute.
pub fn sanitize_css_value(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || " #(),.%-_/+!".contains(*c))
        .collect()
}

/// Accept a user-supplied link/image URL if its scheme is harmless.
///
/// Relative URLs and `http`, `https`, `mailto` and `tel` are allowed; anything with
/// another scheme (`javascript:`, `data:`, `vbscript:`) yields `None`.
pub fn sanitize_url(raw: &str) -> Option<&str> {
    let url = raw.trim();
    if url.is_empty() {
        return None;
    }
    // Browsers ignore ASCII whitespace/control characters inside the scheme.
    let compact: String = url
        .chars()
        .take_while(|c| *c != '/' && *c != '?' && *c != '#')
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase();
    match compact.split_once(':') {
        None => Some(url),
        Some((scheme, _)) if ["http", "https", "mailto", "tel"].contains(&scheme) => Some(url),
        Some(_) => None,
    }
}

/// Turn an arbitrary id into `[A-Za-z0-9_-]` for use in cache keys and DOM ids.
pub fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
