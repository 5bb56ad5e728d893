use serde::Serialize;
use tracing::info;

use super::consent::Toggle;
use super::engine::ConsentRuntime;
use super::host::RecordingHost;
use crate::config::BannerConfig;
use crate::generator::CONSENT_COOKIE;

/// Scripted visitor journeys used by `--simulate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// First visit, "Accept all".
    Accept,
    /// First visit, "Reject".
    Reject,
    /// First visit, opens preferences, enables analytics only and saves.
    Preferences,
    /// First visit, scrolls 200px without deciding.
    Dismiss,
    /// Accepts, then loads a second page with the stored cookie.
    Returning,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub scenario: &'static str,
    /// Tasks still queued by `scheduleTask` before they were flushed.
    pub deferred_tasks: usize,
    pub trace: RecordingHost,
}

impl Scenario {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Preferences => "preferences",
            Self::Dismiss => "dismiss",
            Self::Returning => "returning",
        }
    }

    /// Run the journey against a fresh page, then flush deferred tasks.
    pub fn run(self, config: &BannerConfig) -> SimulationReport {
        info!(target: "bannergen::runtime", scenario = self.as_str(), "Simulating visitor");
        let mut rt = ConsentRuntime::new(config, RecordingHost::new());
        rt.page_load();
        match self {
            Self::Accept => rt.accept_all(),
            Self::Reject => rt.reject(),
            Self::Preferences => {
                rt.open_preferences();
                rt.set_toggle(Toggle::Analytics, true);
                rt.confirm_preferences();
            }
            Self::Dismiss => rt.scroll_to(200.0),
            Self::Returning => {
                rt.accept_all();
                rt.run_pending_tasks();
                let cookie = rt.host().cookies.get(CONSENT_COOKIE).cloned();
                let mut host = RecordingHost::new();
                if let Some(value) = cookie {
                    host = host.with_cookie(CONSENT_COOKIE, value);
                }
                rt = ConsentRuntime::new(config, host);
                rt.page_load();
            }
        }
        let deferred_tasks = rt.pending_tasks();
        rt.run_pending_tasks();
        SimulationReport {
            scenario: self.as_str(),
            deferred_tasks,
            trace: rt.into_host(),
        }
    }
}
