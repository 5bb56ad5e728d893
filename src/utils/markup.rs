//! Escape-by-default HTML and inline-style builders.
//!
//! Every string handed to [`Element::attr`], [`Element::text`] or [`Style::set`]
//! is escaped or sanitized on the way in. The only way to splice pre-rendered
//! content into an element is through a [`Markup`] value, which the public API
//! only produces from escaped text or rendered elements.

use std::fmt;

use super::escape::{escape_comment, escape_html, sanitize_css_value};

/// Rendered, safe-to-embed HTML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    /// Escaped text node.
    pub fn text(s: &str) -> Self {
        Self(escape_html(s))
    }

    /// HTML comment wrapping already-safe markup.
    pub fn comment(inner: &Markup) -> Self {
        Self(format!("<!--\n{}\n-->", escape_comment(&inner.0)))
    }

    /// Content produced by the generator itself (stylesheets, scripts).
    pub(crate) fn trusted(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Concatenate fragments, separated by newlines.
    pub fn join<I: IntoIterator<Item = Markup>>(parts: I) -> Self {
        let rendered: Vec<String> = parts
            .into_iter()
            .filter(|m| !m.is_empty())
            .map(|m| m.0)
            .collect();
        Self(rendered.join("\n"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered list of CSS declarations. Values are sanitized when added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    decls: Vec<(&'static str, String)>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `property: value`. Empty values (after sanitizing) are skipped.
    pub fn set(mut self, property: &'static str, value: impl AsRef<str>) -> Self {
        let value = sanitize_css_value(value.as_ref());
        if !value.is_empty() {
            self.decls.push((property, value));
        }
        self
    }

    pub fn set_if(self, cond: bool, property: &'static str, value: impl AsRef<str>) -> Self {
        if cond { self.set(property, value) } else { self }
    }

    /// Append every declaration of `other`.
    pub fn extend(mut self, other: Style) -> Self {
        self.decls.extend(other.decls);
        self
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.decls
            .iter()
            .rev()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// `prop: value; prop: value;` on a single line.
    pub fn to_css(&self) -> String {
        self.decls
            .iter()
            .map(|(p, v)| format!("{p}: {v};"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// One declaration per line, indented, for stylesheet rule bodies.
    pub fn to_block(&self, indent: &str) -> String {
        self.decls
            .iter()
            .map(|(p, v)| format!("{indent}{p}: {v};"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// An HTML element under construction.
#[derive(Debug, Clone)]
pub struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, Option<String>)>,
    children: Vec<Markup>,
    void: bool,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
            void: false,
        }
    }

    /// Element without children or closing tag (`img`, `input`, ...).
    pub fn void(tag: &'static str) -> Self {
        Self {
            void: true,
            ..Self::new(tag)
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl AsRef<str>) -> Self {
        self.attrs.push((name, Some(escape_html(value.as_ref()))));
        self
    }

    pub fn attr_if(self, cond: bool, name: &'static str, value: impl AsRef<str>) -> Self {
        if cond { self.attr(name, value) } else { self }
    }

    /// Boolean attribute (`checked`, `disabled`).
    pub fn flag(mut self, name: &'static str) -> Self {
        self.attrs.push((name, None));
        self
    }

    pub fn flag_if(self, cond: bool, name: &'static str) -> Self {
        if cond { self.flag(name) } else { self }
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    /// Inline `style` attribute; skipped when `style` is empty.
    pub fn style(self, style: &Style) -> Self {
        if style.is_empty() {
            self
        } else {
            self.attr("style", style.to_css())
        }
    }

    pub fn text(mut self, text: impl AsRef<str>) -> Self {
        self.children.push(Markup::text(text.as_ref()));
        self
    }

    pub fn child(mut self, child: impl Into<Markup>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn child_opt(self, child: Option<impl Into<Markup>>) -> Self {
        match child {
            Some(c) => self.child(c),
            None => self,
        }
    }

    pub fn children<I, M>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Markup>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn render(&self) -> Markup {
        let mut out = String::new();
        out.push('<');
        out.push_str(self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            if let Some(v) = value {
                out.push_str("=\"");
                out.push_str(v);
                out.push('"');
            }
        }
        if self.void {
            out.push_str(" />");
            return Markup(out);
        }
        out.push('>');
        for child in &self.children {
            out.push_str(child.as_str());
        }
        out.push_str("</");
        out.push_str(self.tag);
        out.push('>');
        Markup(out)
    }
}

impl From<Element> for Markup {
    fn from(el: Element) -> Self {
        el.render()
    }
}

impl From<&Element> for Markup {
    fn from(el: &Element) -> Self {
        el.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_nested_elements_with_escaping() {
        let html = Element::new("div")
            .id("box")
            .attr("title", "a \"quoted\" <title>")
            .child(Element::new("span").text("1 < 2 & 3"))
            .render();
        assert_eq!(
            html.as_str(),
            "<div id=\"box\" title=\"a &quot;quoted&quot; &lt;title&gt;\"><span>1 &lt; 2 &amp; 3</span></div>"
        );
    }

    #[test]
    fn void_and_boolean_attributes() {
        let html = Element::void("input")
            .attr("type", "checkbox")
            .flag("checked")
            .render();
        assert_eq!(html.as_str(), "<input type=\"checkbox\" checked />");
    }

    #[test]
    fn style_values_are_sanitized() {
        let style = Style::new()
            .set("color", "red; background: url(evil)")
            .set("width", "");
        assert_eq!(style.to_css(), "color: red background url(evil);");
        let html = Element::new("p").style(&style).render();
        assert_eq!(html.as_str().matches(';').count(), 1);
    }

    #[test]
    fn later_declarations_win_in_get() {
        let style = Style::new().set("top", "0").set("top", "20px");
        assert_eq!(style.get("top"), Some("20px"));
    }

    #[test]
    fn comment_wraps_markup() {
        let inner = Element::new("a").text("x--y").render();
        assert_eq!(
            Markup::comment(&inner).as_str(),
            "<!--\n<a>x&#45;&#45;y</a>\n-->"
        );
    }

    #[test]
    fn join_skips_empty_parts() {
        let joined = Markup::join([Markup::text("a"), Markup::default(), Markup::text("b")]);
        assert_eq!(joined.as_str(), "a\nb");
    }
}
