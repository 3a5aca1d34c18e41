//! Environment loading and service wiring for the binary.

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pdfpress_api::{ApiServer, ApiState};
use pdfpress_compress::{CompressionOrchestrator, GhostscriptInvoker};
use pdfpress_config::ConfigService;
use pdfpress_config::defaults::CONFIG_FILE_NAME;
use pdfpress_events::ActivityLog;
use pdfpress_fsops::Relocator;
use pdfpress_telemetry::{LoggingConfig, Metrics};
use pdfpress_watch::{DirectoryMonitor, MonitorConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::controller::{ControllerDeps, IngestionController};
use crate::error::{AppError, AppResult};

/// Environment variable naming the settings file.
pub const CONFIG_PATH_ENV: &str = "PDFPRESS_CONFIG";
/// Environment variable naming the listen address.
pub const BIND_ENV: &str = "PDFPRESS_BIND";
/// Listen address used when [`BIND_ENV`] is unset.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Process-level settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Settings file location.
    pub config_path: PathBuf,
    /// Control surface listen address.
    pub bind: SocketAddr,
    /// Logging setup.
    pub logging: LoggingConfig<'static>,
}

impl AppConfig {
    /// Resolve from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when [`BIND_ENV`] is not a socket address.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let config_path = non_empty(CONFIG_PATH_ENV)
            .map_or_else(|| PathBuf::from(CONFIG_FILE_NAME), PathBuf::from);
        let bind_raw = non_empty(BIND_ENV).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| AppError::InvalidConfig {
                field: BIND_ENV,
                reason: "invalid_socket_addr",
                value: Some(bind_raw.clone()),
            })?;

        Ok(Self {
            config_path,
            bind,
            logging: LoggingConfig::from_env(),
        })
    }
}

/// Fully wired pipeline plus control surface.
pub struct Services {
    controller: Arc<IngestionController>,
    log: ActivityLog,
    server: ApiServer,
}

impl Services {
    /// Load settings from `config_path` and wire every component.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics registry cannot be built.
    pub async fn build(config_path: &Path) -> AppResult<Self> {
        let config = Arc::new(ConfigService::load(config_path).await);
        let log = ActivityLog::new();
        let metrics =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;

        let relocator = Relocator::new(log.clone(), metrics.clone());
        let orchestrator = CompressionOrchestrator::new(
            Arc::new(GhostscriptInvoker::new()),
            relocator.clone(),
            log.clone(),
            metrics.clone(),
        );
        let monitor = DirectoryMonitor::new(MonitorConfig::default(), log.clone());
        let controller = Arc::new(IngestionController::new(ControllerDeps {
            config: config.clone(),
            monitor,
            orchestrator,
            relocator,
            log: log.clone(),
            metrics: metrics.clone(),
        }));

        let state = ApiState::new(config, controller.clone(), log.clone(), metrics);
        Ok(Self {
            controller,
            log,
            server: ApiServer::new(state),
        })
    }

    /// Handle to the ingestion controller.
    #[must_use]
    pub fn controller(&self) -> Arc<IngestionController> {
        Arc::clone(&self.controller)
    }

    /// Serve until `shutdown` resolves, then stop the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the server terminates unexpectedly.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            controller,
            log,
            server,
        } = self;
        if let Ok(addr) = listener.local_addr() {
            log.info(format!("Server running at http://{addr}"));
        }
        log.info("Ready to compress PDFs");

        let served = server
            .serve(listener, shutdown)
            .await
            .map_err(|err| AppError::io("api.serve", err));

        log.info("Shutting down gracefully...");
        if controller.status().await.running {
            controller.stop().await;
        }
        served
    }
}

/// Entry point for the pdfpress boot sequence.
///
/// # Errors
///
/// Returns an error if logging, the listener, or the server fails.
pub async fn run_app() -> AppResult<()> {
    let app = AppConfig::from_env()?;
    pdfpress_telemetry::init_logging(&app.logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    info!(config = %app.config_path.display(), bind = %app.bind, "pdfpress starting");

    let listener = TcpListener::bind(app.bind)
        .await
        .map_err(|err| AppError::io("listener.bind", err))?;
    let services = Services::build(&app.config_path).await?;
    services.serve(listener, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
