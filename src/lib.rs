#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! bannergen: turns a declarative cookie-banner configuration into embeddable
//! HTML, CSS and JavaScript that enforce consent-gated script loading.
//!
//! Modules:
//! - `config`: `BannerConfig` model, loader, schema and validation.
//! - `generator`: the pure code generators (markup, styles, script loaders, runtime JS).
//! - `runtime`: an executable model of the generated consent state machine.
//! - `output`: writing artifacts to disk.
//! - `watch`: regenerate on config changes.
//! - `utils`: escaping, HTML builders, templates, colors.
//!
//! Use `bannergen::prelude::*` to bring commonly used items into scope quickly.

/// Public module: configuration (models, loader, schema helpers).
pub mod config;
/// Public module: HTML/CSS/JS generation.
pub mod generator;
/// Public module: artifact output.
pub mod output;
/// Public module: consent runtime model.
pub mod runtime;
/// Public module: utilities (escaping, markup, templates, colors).
pub mod utils;
/// Public module: config file watcher.
pub mod watch;

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Parse a simple level name (trace|debug|info|warn|error).
pub fn parse_level(s: &str) -> Option<tracing::Level> {
    use tracing::Level;
    match s.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize tracing (logging) with a reasonable default.
/// - An explicit `level` wins.
/// - Otherwise honors the `RUST_LOG` environment variable if set to a simple level.
/// - Falls back to `info` level.
///
/// Logs go to stderr so generated artifacts can be piped from stdout.
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing(level: Option<&str>) {
    use tracing_subscriber::fmt;

    let level = level
        .and_then(parse_level)
        .or_else(|| std::env::var("RUST_LOG").ok().as_deref().and_then(parse_level))
        .unwrap_or(tracing::Level::INFO);

    // Ignore the error if the global subscriber was already set.
    let _ = fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use bannergen::prelude::*;`
pub mod prelude {
    // Common result/error handling
    pub use anyhow::{Context, Error, Result, anyhow, bail, ensure};

    // Serialization
    pub use serde::{Deserialize, Serialize};

    // Tracing macros
    pub use tracing::{debug, error, info, instrument, trace, warn};

    pub use crate as bannergen;

    // Frequently used items
    pub use crate::config::{BannerConfig, load_from_path, load_from_path_async};
    pub use crate::generator::{
        BannerArtifacts, generate_all, generate_banner_css, generate_banner_html,
        generate_banner_js, generate_consent_init_script, generate_preview_page,
    };
    pub use crate::runtime::{ConsentRuntime, RecordingHost};
    pub use crate::{config, generator, output, runtime, utils, watch};
}
