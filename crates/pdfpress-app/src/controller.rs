//! Ingestion lifecycle: `Stopped` and `Running`.
//!
//! # Design
//! - One run-state lock serializes start, stop, and reconfiguration.
//! - Each stable file is processed on its own task; a path already in flight
//!   is skipped.
//! - Stopping closes the monitor and joins the dispatcher; file tasks already
//!   spawned run to completion.
//! - The dispatcher reads a settings snapshot for every event before the file
//!   task spawns; the task never reads settings again.
//! - Reconfiguration stops the pipeline before saving, so every event from the
//!   old monitor is bound to the old settings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use pdfpress_api::{IngestionControl, IngestionStatus};
use pdfpress_compress::{CompressionOrchestrator, CompressionRequest, detect_ghostscript};
use pdfpress_config::{ConfigResult, Settings, SettingsFacade, validate_for_start};
use pdfpress_events::ActivityLog;
use pdfpress_fsops::Relocator;
use pdfpress_telemetry::Metrics;
use pdfpress_watch::{DirectoryMonitor, IngestionEvent, MonitorHandle};
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Pause between stopping and restarting after a configuration change.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Collaborators injected into [`IngestionController`].
pub struct ControllerDeps {
    /// Settings store, read once per dispatched file.
    pub config: Arc<dyn SettingsFacade>,
    /// Monitor factory.
    pub monitor: DirectoryMonitor,
    /// Per-file compression.
    pub orchestrator: CompressionOrchestrator,
    /// Source relocation after processing.
    pub relocator: Relocator,
    /// Operator-facing activity log.
    pub log: ActivityLog,
    /// Metrics registry.
    pub metrics: Metrics,
}

enum RunState {
    Stopped,
    Running(ActivePipeline),
}

struct ActivePipeline {
    source: PathBuf,
    destination: PathBuf,
    monitor: MonitorHandle,
    dispatcher: JoinHandle<()>,
}

/// Drives the monitor and dispatches stable files to the pipeline.
pub struct IngestionController {
    state: Mutex<RunState>,
    worker: Arc<FileWorker>,
    monitor: DirectoryMonitor,
    settle_delay: Duration,
}

impl IngestionController {
    /// Build a stopped controller.
    #[must_use]
    pub fn new(deps: ControllerDeps) -> Self {
        let ControllerDeps {
            config,
            monitor,
            orchestrator,
            relocator,
            log,
            metrics,
        } = deps;
        metrics.set_ingestion_running(false);
        Self {
            state: Mutex::new(RunState::Stopped),
            worker: Arc::new(FileWorker {
                config,
                orchestrator,
                relocator,
                log,
                in_flight: InFlight::new(metrics.clone()),
                metrics,
            }),
            monitor,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Override the restart pause used by [`IngestionController::reconfigure`].
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Start monitoring the configured source directory.
    ///
    /// Returns `false` when already running or when the settings cannot start
    /// a pipeline; every reason is written to the activity log.
    pub async fn start(&self) -> bool {
        let mut state = self.state.lock().await;
        self.start_locked(&mut state).await
    }

    /// Stop monitoring. Returns `false` when already stopped.
    pub async fn stop(&self) -> bool {
        let mut state = self.state.lock().await;
        if matches!(*state, RunState::Stopped) {
            self.worker.log.warning("Watcher is not running");
            return false;
        }
        self.stop_locked(&mut state).await;
        true
    }

    /// Current run state and in-flight count.
    pub async fn status(&self) -> IngestionStatus {
        let state = self.state.lock().await;
        let in_flight = self.worker.in_flight.len();
        match &*state {
            RunState::Stopped => IngestionStatus {
                in_flight,
                ..IngestionStatus::default()
            },
            RunState::Running(active) => IngestionStatus {
                running: true,
                source: Some(active.source.clone()),
                destination: Some(active.destination.clone()),
                in_flight,
            },
        }
    }

    /// Persist `patch`; a running pipeline is stopped before the save and
    /// restarted after the settle delay.
    ///
    /// # Errors
    ///
    /// Returns the save error; a pipeline that was running is restarted on
    /// the previous settings in that case.
    pub async fn reconfigure(&self, patch: Value) -> ConfigResult<Settings> {
        let mut state = self.state.lock().await;
        let was_running = matches!(*state, RunState::Running(_));
        if was_running {
            self.stop_locked(&mut state).await;
        }

        let saved = match self.worker.config.save(patch).await {
            Ok(saved) => saved,
            Err(err) => {
                self.worker
                    .log
                    .error(format!("Failed to save configuration: {}", err.describe()));
                if was_running {
                    self.start_locked(&mut state).await;
                }
                return Err(err);
            }
        };
        self.worker.log.info("Configuration saved");

        if was_running {
            tokio::time::sleep(self.settle_delay).await;
            self.start_locked(&mut state).await;
        }
        drop(state);
        Ok(saved)
    }

    /// Number of files currently being processed.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.worker.in_flight.len()
    }

    #[instrument(name = "controller.start", skip_all)]
    async fn start_locked(&self, state: &mut RunState) -> bool {
        if matches!(*state, RunState::Running(_)) {
            self.worker.log.warning("Watcher is already running");
            return false;
        }

        let settings = self.worker.config.get().await;
        let problems = validate_for_start(&settings);
        if !problems.is_empty() {
            for problem in &problems {
                self.worker.log.error(problem.describe());
            }
            return false;
        }

        let source = settings.source_dir();
        let destination = settings.dest_dir();
        self.worker
            .log
            .info(format!("Starting watcher on: {}", source.display()));
        if let Err(err) = self.worker.relocator.ensure_subtrees(&source).await {
            self.worker.log.error(format!(
                "Failed to create organization folders: {}",
                err.describe()
            ));
            return false;
        }

        let (monitor, events) = match self.monitor.watch(&source) {
            Ok(pair) => pair,
            Err(err) => {
                self.worker
                    .log
                    .error(format!("Watcher error: {}", err.describe()));
                return false;
            }
        };
        let dispatcher = tokio::spawn(dispatch_loop(Arc::clone(&self.worker), events));

        *state = RunState::Running(ActivePipeline {
            source,
            destination,
            monitor,
            dispatcher,
        });
        self.worker.metrics.set_ingestion_running(true);
        info!("ingestion started");
        true
    }

    #[instrument(name = "controller.stop", skip_all)]
    async fn stop_locked(&self, state: &mut RunState) {
        let RunState::Running(active) = std::mem::replace(state, RunState::Stopped) else {
            return;
        };
        active.monitor.close().await;
        if let Err(err) = active.dispatcher.await {
            warn!(error = %err, "dispatcher task ended abnormally");
        }
        self.worker.metrics.set_ingestion_running(false);
        self.worker.log.info("Watcher stopped");
    }
}

#[async_trait]
impl IngestionControl for IngestionController {
    async fn start(&self) -> bool {
        Self::start(self).await
    }

    async fn stop(&self) -> bool {
        Self::stop(self).await
    }

    async fn status(&self) -> IngestionStatus {
        Self::status(self).await
    }

    async fn reconfigure(&self, patch: Value) -> ConfigResult<Settings> {
        Self::reconfigure(self, patch).await
    }
}

async fn dispatch_loop(
    worker: Arc<FileWorker>,
    mut events: mpsc::UnboundedReceiver<IngestionEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(claim) = worker.in_flight.claim(&event.path) else {
            debug!(path = %event.path.display(), "already in flight; skipping");
            continue;
        };
        worker
            .log
            .info(format!("New PDF detected: {}", event.path.display()));
        let settings = worker.config.get().await;
        let worker = Arc::clone(&worker);
        tokio::spawn(async move {
            worker.process(&event.path, &settings).await;
            drop(claim);
        });
    }
}

/// Shared per-file processing context.
struct FileWorker {
    config: Arc<dyn SettingsFacade>,
    orchestrator: CompressionOrchestrator,
    relocator: Relocator,
    log: ActivityLog,
    metrics: Metrics,
    in_flight: Arc<InFlight>,
}

impl FileWorker {
    #[instrument(name = "controller.process_file", skip_all, fields(path = %path.display()))]
    async fn process(&self, path: &Path, settings: &Settings) {
        let Some(file_name) = path.file_name() else {
            warn!("event path has no file name");
            return;
        };

        let final_output = settings.dest_dir().join(file_name);
        let tool = detect_ghostscript(settings.ghostscript_path.as_deref());
        let request = CompressionRequest {
            input: path,
            final_output: &final_output,
            policy: &settings.policy,
            tool: &tool,
        };

        let succeeded = match self.orchestrator.process(request).await {
            Ok(outcome) => {
                info!(
                    profile = outcome.profile.label(),
                    original = outcome.original_size,
                    final_size = outcome.final_size,
                    "file processed"
                );
                outcome.success
            }
            Err(err) => {
                self.log.error(format!("Compression error: {}", err.describe()));
                false
            }
        };
        self.relocator.relocate(path, succeeded).await;
    }
}

/// Paths currently owned by a file task.
struct InFlight {
    paths: StdMutex<HashSet<PathBuf>>,
    metrics: Metrics,
}

impl InFlight {
    fn new(metrics: Metrics) -> Arc<Self> {
        Arc::new(Self {
            paths: StdMutex::new(HashSet::new()),
            metrics,
        })
    }

    fn len(&self) -> usize {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn claim(self: &Arc<Self>, path: &Path) -> Option<InFlightClaim> {
        let mut paths = self.paths.lock().unwrap_or_else(PoisonError::into_inner);
        if !paths.insert(path.to_path_buf()) {
            return None;
        }
        self.metrics.set_files_in_flight(paths.len());
        drop(paths);
        Some(InFlightClaim {
            owner: Arc::clone(self),
            path: path.to_path_buf(),
        })
    }
}

/// Releases its path when dropped.
struct InFlightClaim {
    owner: Arc<InFlight>,
    path: PathBuf,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        let mut paths = self
            .owner
            .paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        paths.remove(&self.path);
        self.owner.metrics.set_files_in_flight(paths.len());
    }
}
