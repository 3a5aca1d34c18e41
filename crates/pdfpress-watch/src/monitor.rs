//! Non-recursive directory monitor.
//!
//! # Design
//! - `notify` delivers change hints; a poll loop decides stability from file metadata.
//! - Files already present when the watch starts are treated like new arrivals.
//! - The backend lives inside the monitor task; dropping or closing the handle
//!   stops it and closes the event stream.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use pdfpress_events::ActivityLog;
use pdfpress_fsops::should_ignore;
use tokio::fs;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::error::{WatchError, WatchResult};
use crate::tracker::{Fingerprint, Probe, Tracker};

/// Time a file's size and mtime must stay unchanged before it is emitted.
pub const DEFAULT_STABILITY_WINDOW: Duration = Duration::from_millis(2_000);
/// Interval between stability checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A file that finished arriving in the watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionEvent {
    /// Path of the file inside the watched root.
    pub path: PathBuf,
    /// When the file was judged stable.
    pub discovered_at: DateTime<Utc>,
}

/// Timing knobs for [`DirectoryMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// See [`DEFAULT_STABILITY_WINDOW`].
    pub stability_window: Duration,
    /// See [`DEFAULT_POLL_INTERVAL`].
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            stability_window: DEFAULT_STABILITY_WINDOW,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Factory for directory watches.
#[derive(Clone)]
pub struct DirectoryMonitor {
    config: MonitorConfig,
    log: ActivityLog,
}

impl DirectoryMonitor {
    /// Monitor reporting backend problems to `log`.
    #[must_use]
    pub const fn new(config: MonitorConfig, log: ActivityLog) -> Self {
        Self { config, log }
    }

    /// Timing configuration.
    #[must_use]
    pub const fn config(&self) -> MonitorConfig {
        self.config
    }

    /// Watch `root` (non-recursively) until the returned handle is closed.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error when `root` is not a directory or the backend refuses it.
    pub fn watch(
        &self,
        root: &Path,
    ) -> WatchResult<(MonitorHandle, mpsc::UnboundedReceiver<IngestionEvent>)> {
        if !root.is_dir() {
            return Err(WatchError::NotADirectory {
                path: root.to_path_buf(),
            });
        }
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |event| {
            if raw_tx.send(event).is_err() {
                debug!("watch event dropped because monitor task has stopped");
            }
        })
        .map_err(|source| backend_error("watch.create", &root, source))?;
        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|source| backend_error("watch.register", &root, source))?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = MonitorTask {
            root,
            config: self.config,
            log: self.log.clone(),
            tracker: Tracker::new(self.config.stability_window),
            events: events_tx,
        };
        let join = tokio::spawn(task.run(watcher, raw_rx, shutdown_rx));

        Ok((
            MonitorHandle {
                shutdown: Some(shutdown_tx),
                join,
            },
            events_rx,
        ))
    }
}

/// Handle owning a running watch.
pub struct MonitorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stop the backend and wait for the monitor task to finish.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(err) = (&mut self.join).await {
            warn!(error = %err, "monitor task ended abnormally");
        }
    }
}

struct MonitorTask {
    root: PathBuf,
    config: MonitorConfig,
    log: ActivityLog,
    tracker: Tracker,
    events: mpsc::UnboundedSender<IngestionEvent>,
}

impl MonitorTask {
    async fn run(
        mut self,
        watcher: RecommendedWatcher,
        mut raw: mpsc::UnboundedReceiver<notify::Result<Event>>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        info!(root = %self.root.display(), "directory monitor started");
        self.initial_scan().await;

        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                Some(event) = raw.recv() => self.handle_backend(event).await,
                _ = ticker.tick() => {
                    if !self.emit_ready().await {
                        break;
                    }
                }
            }
        }

        drop(watcher);
        info!(root = %self.root.display(), "directory monitor stopped");
    }

    async fn initial_scan(&mut self) {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) => {
                self.log.warning(format!(
                    "Initial scan of {} failed: {err}",
                    self.root.display()
                ));
                return;
            }
        };
        let now = Instant::now().into_std();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    if self.is_candidate(&path) {
                        self.tracker.observe(path, now);
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(root = %self.root.display(), error = %err, "initial scan interrupted");
                    break;
                }
            }
        }
    }

    async fn handle_backend(&mut self, event: notify::Result<Event>) {
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                self.log.warning(format!("Watcher error: {err}"));
                return;
            }
        };

        let now = Instant::now().into_std();
        let recreated = matches!(event.kind, EventKind::Create(_))
            || matches!(
                event.kind,
                EventKind::Modify(ModifyKind::Name(RenameMode::To))
            );
        for path in event.paths {
            if !self.is_candidate(&path) {
                continue;
            }
            if fs::try_exists(&path).await.unwrap_or(false) {
                if recreated {
                    self.tracker.recreated(path, now);
                } else {
                    self.tracker.observe(path, now);
                }
            } else {
                self.tracker.forget(&path);
            }
        }
    }

    /// Returns `false` once nobody is listening.
    async fn emit_ready(&mut self) -> bool {
        let mut probes = HashMap::new();
        for path in self.tracker.pending_paths() {
            let state = probe(&path).await;
            probes.insert(path, state);
        }
        let now = Instant::now().into_std();
        let ready = self.tracker.poll(now, |path| {
            probes.get(path).copied().unwrap_or(Probe::Gone)
        });
        for path in ready {
            debug!(path = %path.display(), "file stable");
            let event = IngestionEvent {
                path,
                discovered_at: Utc::now(),
            };
            if self.events.send(event).is_err() {
                return false;
            }
        }
        true
    }

    fn is_candidate(&self, path: &Path) -> bool {
        path.parent() == Some(self.root.as_path())
            && path
                .extension()
                .and_then(OsStr::to_str)
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
            && !should_ignore(path)
    }
}

async fn probe(path: &Path) -> Probe {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Probe::File(Fingerprint {
            len: meta.len(),
            modified: meta.modified().ok(),
        }),
        Ok(_) => Probe::NotAFile,
        Err(_) => Probe::Gone,
    }
}

fn backend_error(operation: &'static str, root: &Path, source: notify::Error) -> WatchError {
    WatchError::Backend {
        operation,
        path: root.to_path_buf(),
        source,
    }
}
