//! Config file watcher.
//!
//! Polls one config file and sends every successfully loaded revision into a
//! channel. A revision is detected by its (length, mtime seconds) signature.
//!
//! - The revision present when the watcher starts is not re-sent.
//! - Invalid JSON or a config failing validation is logged once per revision;
//!   the watcher waits for the next edit.
//! - A missing file is silent until it reappears.
//! - The task ends when the receiving side of the channel is dropped.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tokio::{
    fs as afs,
    sync::mpsc::Sender,
    task::JoinHandle,
    time::{Instant, sleep},
};
use tracing::{error, info, trace, warn};

use crate::config::{self, BannerConfig};

/// Coarse change signature of a file.
type Signature = (u64, u64);

#[derive(Debug, Clone)]
pub struct ConfigWatcher {
    path: PathBuf,
    poll_ms: u64,
}

impl ConfigWatcher {
    /// `poll_ms` defaults to 500ms with a floor of 10ms.
    pub fn new(path: impl Into<PathBuf>, poll_ms: Option<u64>) -> Self {
        Self {
            path: path.into(),
            poll_ms: poll_ms.unwrap_or(500).max(10),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    fn signature(meta: &fs::Metadata) -> Signature {
        let len = meta.len();
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        (len, mtime)
    }

    fn current_signature(&self) -> Option<Signature> {
        match fs::metadata(&self.path) {
            Ok(meta) if meta.is_file() => Some(Self::signature(&meta)),
            _ => None,
        }
    }

    /// Spawn the polling task.
    pub fn start(&self, sender: Sender<BannerConfig>) -> JoinHandle<()> {
        let watcher = self.clone();

        tokio::spawn(async move {
            let path = watcher.path.display().to_string();
            info!(
                target: "bannergen::watch",
                %path, poll_ms = watcher.poll_ms,
                "Watching config for changes"
            );

            let mut last_sig = watcher.current_signature();
            let interval = watcher.poll_interval();
            let mut next_tick = Instant::now() + interval;

            loop {
                let now = Instant::now();
                if now < next_tick {
                    sleep(next_tick - now).await;
                }
                next_tick += interval;

                if sender.is_closed() {
                    break;
                }

                let Some(sig) = watcher.current_signature() else {
                    continue;
                };
                if last_sig == Some(sig) {
                    trace!(target: "bannergen::watch", %path, "Config unchanged");
                    continue;
                }
                last_sig = Some(sig);

                let content = match afs::read_to_string(&watcher.path).await {
                    Ok(content) => content,
                    Err(e) => {
                        warn!(target: "bannergen::watch", %path, error = %e, "Failed to read config");
                        continue;
                    }
                };
                if content.trim().is_empty() {
                    trace!(target: "bannergen::watch", %path, "Config is empty; ignoring");
                    continue;
                }

                match config::load_from_str(&content) {
                    Ok(cfg) => {
                        info!(target: "bannergen::watch", %path, "Config changed; reloading");
                        if let Err(e) = sender.send(cfg).await {
                            error!(
                                target: "bannergen::watch",
                                %path, error = %e,
                                "Channel closed; watcher terminating"
                            );
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(
                            target: "bannergen::watch",
                            %path, error = format!("{e:#}"),
                            "Changed config is invalid; waiting for the next edit"
                        );
                    }
                }
            }

            info!(target: "bannergen::watch", %path, "Watcher stopped");
        })
    }
}
