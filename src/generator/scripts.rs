//! Consent-gated script loaders.
//!
//! Pasted tracking code is classified once, at generation time, into loader steps.
//! The same [`LoadPlan`] drives both the emitted JavaScript and the Rust runtime
//! model in [`crate::runtime`], so the two cannot disagree about what loads when.
//!
//! Gating (compliance-relevant, fixed):
//!
//! | list                   | runs when               |
//! |------------------------|-------------------------|
//! | `strictlyNecessary`    | always                  |
//! | `functionality`        | `consent.functionality` |
//! | `trackingPerformance`  | `consent.analytics`     |
//! | `targetingAdvertising` | `consent.marketing`     |

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{BannerConfig, TrackingCategory, TrackingScript};
use crate::utils::escape::{encode_script_code, js_string};

/// Categories in the order `loadScripts` visits them.
pub const CATEGORY_ORDER: [TrackingCategory; 4] = [
    TrackingCategory::StrictlyNecessary,
    TrackingCategory::Functionality,
    TrackingCategory::TrackingPerformance,
    TrackingCategory::TargetingAdvertising,
];

/// One injection performed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoaderStep {
    /// `<script src>` appended to `<head>`; deduplicated by `src`.
    External { src: String },
    /// Base64 payload executed as an inline script; deduplicated by `cache_key`.
    Inline { encoded: String, cache_key: String },
    /// Base64 markup appended to `<body>`; deduplicated by `cache_key`.
    Body { encoded: String, cache_key: String },
}

impl LoaderStep {
    /// Key under which the runtime remembers this step was performed.
    pub fn dedup_key(&self) -> &str {
        match self {
            Self::External { src } => src,
            Self::Inline { cache_key, .. } | Self::Body { cache_key, .. } => cache_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptLoader {
    pub script_id: String,
    pub name: String,
    pub step: LoaderStep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryPlan {
    pub category: TrackingCategory,
    /// Wrap every step in `scheduleTask`.
    pub lazy: bool,
    pub loaders: Vec<ScriptLoader>,
}

/// All loaders of a banner, in `CATEGORY_ORDER`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadPlan {
    pub categories: Vec<CategoryPlan>,
}

impl LoadPlan {
    pub fn from_config(config: &BannerConfig) -> Self {
        let categories = CATEGORY_ORDER
            .iter()
            .map(|category| CategoryPlan {
                category: *category,
                lazy: is_lazy(config, *category),
                loaders: plan_scripts(config.scripts.list(*category), *category),
            })
            .collect();
        Self { categories }
    }

    pub fn category(&self, category: TrackingCategory) -> Option<&CategoryPlan> {
        self.categories.iter().find(|p| p.category == category)
    }
}

/// Options for [`generate_script_loaders`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LoaderOptions {
    pub lazy: bool,
}

/// Whether a category's loaders are deferred through `scheduleTask`.
pub fn is_lazy(config: &BannerConfig, category: TrackingCategory) -> bool {
    let perf = &config.advanced.performance;
    match category {
        TrackingCategory::StrictlyNecessary => false,
        TrackingCategory::Functionality | TrackingCategory::TargetingAdvertising => {
            perf.defer_non_critical_scripts
        }
        TrackingCategory::TrackingPerformance => {
            perf.defer_non_critical_scripts || perf.lazy_load_analytics
        }
    }
}

/// Classify the active scripts of one list into loader steps.
pub fn plan_scripts(scripts: &[TrackingScript], category: TrackingCategory) -> Vec<ScriptLoader> {
    let mut loaders = Vec::new();

    for script in scripts.iter().filter(|s| s.is_active()) {
        let key = script.cache_key(category);
        let snippet = parse_snippet(&script.script_code);

        for src in snippet.external_srcs {
            loaders.push(ScriptLoader {
                script_id: script.id.clone(),
                name: script.name.clone(),
                step: LoaderStep::External { src },
            });
        }

        let encoded = encode_script_code(&snippet.inline_code);
        if !encoded.is_empty() {
            loaders.push(ScriptLoader {
                script_id: script.id.clone(),
                name: script.name.clone(),
                step: LoaderStep::Inline {
                    encoded,
                    cache_key: key,
                },
            });
        }

        if let Some(body) = script.body_code.as_deref() {
            let encoded = encode_body_code(body);
            if !encoded.is_empty() {
                loaders.push(ScriptLoader {
                    script_id: script.id.clone(),
                    name: script.name.clone(),
                    step: LoaderStep::Body {
                        encoded,
                        cache_key: script.body_cache_key(category),
                    },
                });
            }
        }
    }

    debug!(
        target: "bannergen::generator",
        category = category.as_str(),
        active = scripts.iter().filter(|s| s.is_active()).count(),
        loaders = loaders.len(),
        "Planned script loaders"
    );
    loaders
}

/// JavaScript statements that inject the active scripts of one list.
///
/// With `lazy`, each statement is wrapped in `scheduleTask(function () { ... })`.
pub fn generate_script_loaders(
    scripts: &[TrackingScript],
    category: TrackingCategory,
    options: LoaderOptions,
) -> String {
    render_loaders(&plan_scripts(scripts, category), options)
}

/// Render planned loaders as the body of a loader function.
pub fn render_loaders(loaders: &[ScriptLoader], options: LoaderOptions) -> String {
    if loaders.is_empty() {
        return "    // No active scripts in this category.".to_string();
    }
    loaders
        .iter()
        .map(|loader| {
            let call = loader_call(loader);
            if options.lazy {
                format!("    scheduleTask(function () {{ {call} }});")
            } else {
                format!("    {call}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn loader_call(loader: &ScriptLoader) -> String {
    let name = js_string(&loader.name);
    match &loader.step {
        LoaderStep::External { src } => {
            format!("loadExternalScript({}, {name});", js_string(src))
        }
        LoaderStep::Inline { encoded, cache_key } => format!(
            "injectInlineScript({}, {name}, {});",
            js_string(encoded),
            js_string(cache_key)
        ),
        LoaderStep::Body { encoded, cache_key } => format!(
            "injectBodyCode({}, {name}, {});",
            js_string(encoded),
            js_string(cache_key)
        ),
    }
}

/// Body markup keeps its tags; only emptiness is normalized.
fn encode_body_code(body: &str) -> String {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    let trimmed = body.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        STANDARD.encode(trimmed.as_bytes())
    }
}

/// A pasted snippet split into external sources and remaining inline code.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedSnippet {
    pub external_srcs: Vec<String>,
    pub inline_code: String,
}

/// Split pasted tracking code into `<script src>` URLs and inline code.
///
/// A bare URL (`https://...`, `//...`) counts as one external source. Script tags
/// carrying a `src` are removed from the inline remainder together with their body.
pub fn parse_snippet(code: &str) -> ParsedSnippet {
    let trimmed = code.trim();
    if is_bare_url(trimmed) {
        return ParsedSnippet {
            external_srcs: accept_src(trimmed).into_iter().collect(),
            inline_code: String::new(),
        };
    }

    let lower = trimmed.to_ascii_lowercase();
    let mut parsed = ParsedSnippet::default();
    let mut idx = 0;

    while let Some(rel) = lower[idx..].find("<script") {
        let tag_start = idx + rel;
        let Some(tag_len) = lower[tag_start..].find('>') else {
            break;
        };
        let tag_end = tag_start + tag_len + 1;
        let tag = &trimmed[tag_start..tag_end];

        match extract_src(tag) {
            Some(src) => {
                parsed.inline_code.push_str(&trimmed[idx..tag_start]);
                parsed.external_srcs.extend(accept_src(&src));
                // Drop the (normally empty) body and the closing tag.
                idx = match lower[tag_end..].find("</script") {
                    Some(close_rel) => {
                        let close = tag_end + close_rel;
                        lower[close..]
                            .find('>')
                            .map_or(trimmed.len(), |gt| close + gt + 1)
                    }
                    None => tag_end,
                };
            }
            None => {
                parsed.inline_code.push_str(&trimmed[idx..tag_end]);
                idx = tag_end;
            }
        }
    }
    parsed.inline_code.push_str(&trimmed[idx..]);
    parsed
}

fn is_bare_url(s: &str) -> bool {
    (s.starts_with("https://") || s.starts_with("http://") || s.starts_with("//"))
        && !s.contains(char::is_whitespace)
        && !s.contains('<')
}

fn accept_src(src: &str) -> Option<String> {
    let src = src.trim();
    let scheme = src.to_ascii_lowercase();
    if src.is_empty() || scheme.starts_with("javascript:") || scheme.starts_with("data:") {
        warn!(
            target: "bannergen::generator",
            src = %src,
            "Ignoring script source with an empty or disallowed URL"
        );
        return None;
    }
    Some(src.to_string())
}

/// Value of the `src` attribute of a single opening tag, entity `&amp;` decoded.
pub fn extract_src(tag: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut search = 0;

    while let Some(rel) = lower[search..].find("src") {
        let at = search + rel;
        search = at + 3;
        let preceded_ok = at > 0 && bytes[at - 1].is_ascii_whitespace();
        if !preceded_ok {
            continue;
        }
        let rest = lower[at + 3..].trim_start();
        let Some(after_eq) = rest.strip_prefix('=') else {
            continue;
        };
        let value_start = tag.len() - after_eq.trim_start().len();
        let value = &tag[value_start..];
        let raw = match value.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let inner = &value[1..];
                &inner[..inner.find(q)?]
            }
            Some(_) => {
                let end = value
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(value.len());
                &value[..end]
            }
            None => return None,
        };
        return Some(raw.replace("&amp;", "&"));
    }
    None
}
