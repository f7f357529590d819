//! Configuration file watcher for credential rotation.
//!
//! Credential tokens are rotated out-of-band; editing the config file is one
//! of the ways a new token reaches a running client. Only the token is applied
//! live, so a reload is published only when the token actually changed.
//!
//! The parent directory is watched rather than the file: editors that save by
//! writing a temp file and renaming it would otherwise detach the watch.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ClientConfig;

/// Watches one config file and publishes reloads that rotate the token.
pub struct ConfigWatcher {
    path: PathBuf,
    last_token: Mutex<Option<String>>,
    update_tx: mpsc::UnboundedSender<ClientConfig>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`, seeded with the token already in use.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(
        path: &Path,
        current: &ClientConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ClientConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let watcher = Self {
            path: path.to_path_buf(),
            last_token: Mutex::new(current.credentials.token.clone()),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching in notify's background thread.
    ///
    /// The returned watcher must be kept alive for updates to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = watch_dir(&self.path);
        let file_name = self.path.file_name().map(OsString::from);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if is_relevant(&event, file_name.as_deref()) {
                        self.reload();
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(dir = ?dir, "Config watcher started");
        Ok(watcher)
    }

    fn reload(&self) {
        let new_config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current credentials");
                return;
            }
        };

        let mut last = self.last_token.lock().unwrap_or_else(PoisonError::into_inner);
        if *last == new_config.credentials.token {
            tracing::debug!("Config changed without a new credential token");
            return;
        }
        *last = new_config.credentials.token.clone();
        drop(last);

        tracing::info!("Config reloaded with a rotated credential token");
        let _ = self.update_tx.send(new_config);
    }
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Whether `event` touched the watched file in a way worth reloading for.
fn is_relevant(event: &Event, file_name: Option<&std::ffi::OsStr>) -> bool {
    let kind_matches = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
    let Some(file_name) = file_name else {
        return false;
    };
    kind_matches
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name))
}
