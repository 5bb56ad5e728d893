use std::collections::HashSet;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::{debug, warn};

use super::host::{BrowserHost, ConsoleLevel, HostError};
use crate::generator::scripts::{LoaderStep, ScriptLoader};

/// Outcome of one loader step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injection {
    Injected,
    /// Already performed earlier in this page life.
    Skipped,
    /// Attempted and failed; it will not be retried.
    Failed(HostError),
}

/// Remembers what has been injected during one page life.
///
/// The mark is set before the attempt, so a failing script is never retried.
/// Inline scripts and body markup share the cache-key set; external scripts are
/// keyed by `src`.
#[derive(Debug, Default)]
pub struct ScriptInjector {
    inline: HashSet<String>,
    external: HashSet<String>,
}

impl ScriptInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_injected(&self, step: &LoaderStep) -> bool {
        match step {
            LoaderStep::External { src } => self.external.contains(src),
            LoaderStep::Inline { cache_key, .. } | LoaderStep::Body { cache_key, .. } => {
                self.inline.contains(cache_key)
            }
        }
    }

    /// `loadExternalScript(src, name)` outside of a planned loader.
    pub fn load_external<H: BrowserHost>(&mut self, host: &mut H, src: &str, name: &str) -> Injection {
        let step = LoaderStep::External {
            src: src.to_string(),
        };
        self.perform(host, &step, name)
    }

    pub fn inject<H: BrowserHost>(&mut self, host: &mut H, loader: &ScriptLoader) -> Injection {
        self.perform(host, &loader.step, &loader.name)
    }

    fn perform<H: BrowserHost>(&mut self, host: &mut H, step: &LoaderStep, name: &str) -> Injection {
        let fresh = match step {
            LoaderStep::External { src } => self.external.insert(src.clone()),
            LoaderStep::Inline { cache_key, .. } | LoaderStep::Body { cache_key, .. } => {
                self.inline.insert(cache_key.clone())
            }
        };
        if !fresh {
            debug!(target: "bannergen::runtime", key = step.dedup_key(), %name, "Already injected; skipping");
            return Injection::Skipped;
        }

        let result = match step {
            LoaderStep::External { src } => host.append_external_script(src, name),
            LoaderStep::Inline { encoded, .. } => {
                decode(encoded, name).and_then(|code| host.run_inline_script(&code, name))
            }
            LoaderStep::Body { encoded, .. } => {
                decode(encoded, name).and_then(|markup| host.append_body_markup(&markup, name))
            }
        };

        match result {
            Ok(()) => Injection::Injected,
            Err(err) => {
                warn!(target: "bannergen::runtime", %name, error = %err, "Script injection failed");
                host.console(ConsoleLevel::Error, format!("[cookie-banner] {err}"));
                Injection::Failed(err)
            }
        }
    }
}

fn decode(encoded: &str, name: &str) -> Result<String, HostError> {
    let decode_err = || HostError::Decode {
        name: name.to_string(),
    };
    let bytes = STANDARD.decode(encoded).map_err(|_| decode_err())?;
    String::from_utf8(bytes).map_err(|_| decode_err())
}
