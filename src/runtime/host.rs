//! The page the consent runtime acts on.
//!
//! [`BrowserHost`] is the seam between the state machine and the DOM/cookie
//! APIs. [`RecordingHost`] implements it in memory and keeps a trace of every
//! effect, which is what tests and `--simulate` inspect.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use super::consent::ConsentState;

/// Failure raised by the page while injecting a script.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("script '{name}' threw: {message}")]
    ScriptFailed { name: String, message: String },
    #[error("payload of '{name}' is not valid base64 UTF-8")]
    Decode { name: String },
}

/// A `document.cookie` assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieWrite {
    pub name: String,
    pub value: String,
    pub max_age_days: u32,
    pub path: &'static str,
    pub same_site: &'static str,
    pub secure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiElement {
    Banner,
    PreferencesModal,
    FloatingButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Granted,
    Denied,
}

impl From<bool> for Signal {
    fn from(granted: bool) -> Self {
        if granted { Self::Granted } else { Self::Denied }
    }
}

/// A `gtag(...)` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum GtagCall {
    ConsentUpdate {
        signals: BTreeMap<&'static str, Signal>,
    },
    Js,
    Config {
        measurement_id: String,
        anonymize_ip: bool,
    },
    Event {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        consent: Option<ConsentState>,
    },
}

/// How `scheduleTask` deferred a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum Deferral {
    IdleCallback { timeout_ms: u32 },
    Timeout { delay_ms: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Warn,
    Error,
}

/// Everything the consent runtime needs from the page.
pub trait BrowserHost {
    fn cookie(&self, name: &str) -> Option<String>;
    fn set_cookie(&mut self, cookie: CookieWrite);
    fn is_https(&self) -> bool;

    fn append_external_script(&mut self, src: &str, name: &str) -> Result<(), HostError>;
    fn run_inline_script(&mut self, code: &str, name: &str) -> Result<(), HostError>;
    fn append_body_markup(&mut self, markup: &str, name: &str) -> Result<(), HostError>;

    fn idle_callback_available(&self) -> bool;
    fn scheduled(&mut self, name: &str, deferral: Deferral);

    fn gtag(&mut self, call: GtagCall);
    fn set_visible(&mut self, element: UiElement, visible: bool);
    fn set_floating_icon(&mut self, icon: &str);
    fn console(&mut self, level: ConsoleLevel, message: String);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomInsertion {
    ExternalScript { src: String, name: String },
    InlineScript { code: String, name: String },
    BodyMarkup { markup: String, name: String },
}

impl DomInsertion {
    pub fn name(&self) -> &str {
        match self {
            Self::ExternalScript { name, .. }
            | Self::InlineScript { name, .. }
            | Self::BodyMarkup { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledTask {
    pub name: String,
    #[serde(flatten)]
    pub deferral: Deferral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsoleLine {
    pub level: ConsoleLevel,
    pub message: String,
}

/// In-memory page that records every effect.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingHost {
    pub cookies: BTreeMap<String, String>,
    pub cookie_writes: Vec<CookieWrite>,
    pub insertions: Vec<DomInsertion>,
    pub scheduled: Vec<ScheduledTask>,
    pub gtag_calls: Vec<GtagCall>,
    pub visibility: BTreeMap<UiElement, bool>,
    pub visibility_changes: Vec<(UiElement, bool)>,
    pub floating_icon: Option<String>,
    pub console: Vec<ConsoleLine>,
    #[serde(skip)]
    pub https: bool,
    #[serde(skip)]
    pub idle_callback: bool,
    /// Script names whose execution throws.
    #[serde(skip)]
    pub failing: BTreeSet<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page that already carries a consent cookie.
    pub fn with_cookie(mut self, name: &str, value: impl Into<String>) -> Self {
        self.cookies.insert(name.to_string(), value.into());
        self
    }

    pub fn with_idle_callback(mut self, available: bool) -> Self {
        self.idle_callback = available;
        self
    }

    pub fn with_https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    /// Make every script called `name` throw when executed.
    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn is_visible(&self, element: UiElement) -> bool {
        self.visibility.get(&element).copied().unwrap_or(false)
    }

    /// Whether `element` was ever made visible.
    pub fn was_shown(&self, element: UiElement) -> bool {
        self.visibility_changes
            .iter()
            .any(|(el, visible)| *el == element && *visible)
    }

    /// DOM insertions made for the script called `name`.
    pub fn insertions_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DomInsertion> {
        self.insertions.iter().filter(move |i| i.name() == name)
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.gtag_calls.iter().filter_map(|call| match call {
            GtagCall::Event { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    fn check(&self, name: &str) -> Result<(), HostError> {
        if self.failing.contains(name) {
            return Err(HostError::ScriptFailed {
                name: name.to_string(),
                message: "simulated failure".into(),
            });
        }
        Ok(())
    }
}

impl BrowserHost for RecordingHost {
    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn set_cookie(&mut self, cookie: CookieWrite) {
        self.cookies.insert(cookie.name.clone(), cookie.value.clone());
        self.cookie_writes.push(cookie);
    }

    fn is_https(&self) -> bool {
        self.https
    }

    fn append_external_script(&mut self, src: &str, name: &str) -> Result<(), HostError> {
        trace!(target: "bannergen::runtime", %src, %name, "append external script");
        // The element is appended before the network request can fail.
        self.insertions.push(DomInsertion::ExternalScript {
            src: src.to_string(),
            name: name.to_string(),
        });
        self.check(name)
    }

    fn run_inline_script(&mut self, code: &str, name: &str) -> Result<(), HostError> {
        self.check(name)?;
        self.insertions.push(DomInsertion::InlineScript {
            code: code.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    fn append_body_markup(&mut self, markup: &str, name: &str) -> Result<(), HostError> {
        self.check(name)?;
        self.insertions.push(DomInsertion::BodyMarkup {
            markup: markup.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    fn idle_callback_available(&self) -> bool {
        self.idle_callback
    }

    fn scheduled(&mut self, name: &str, deferral: Deferral) {
        self.scheduled.push(ScheduledTask {
            name: name.to_string(),
            deferral,
        });
    }

    fn gtag(&mut self, call: GtagCall) {
        self.gtag_calls.push(call);
    }

    fn set_visible(&mut self, element: UiElement, visible: bool) {
        self.visibility.insert(element, visible);
        self.visibility_changes.push((element, visible));
    }

    fn set_floating_icon(&mut self, icon: &str) {
        self.floating_icon = Some(icon.to_string());
    }

    fn console(&mut self, level: ConsoleLevel, message: String) {
        self.console.push(ConsoleLine { level, message });
    }
}
