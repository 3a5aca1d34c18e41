//! Lifecycle seam between the HTTP surface and the ingestion controller.

use std::path::PathBuf;

use async_trait::async_trait;
use pdfpress_config::{ConfigResult, Settings};
use serde::Serialize;
use serde_json::Value;

/// Point-in-time view of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionStatus {
    /// Whether the monitor is running.
    pub running: bool,
    /// Watched directory while running.
    pub source: Option<PathBuf>,
    /// Output directory while running.
    pub destination: Option<PathBuf>,
    /// Files currently being compressed or relocated.
    pub in_flight: usize,
}

/// Operations the control surface drives.
#[async_trait]
pub trait IngestionControl: Send + Sync {
    /// Start monitoring; `false` when already running or settings are invalid.
    async fn start(&self) -> bool;

    /// Stop monitoring; `false` when already stopped.
    async fn stop(&self) -> bool;

    /// Current pipeline status.
    async fn status(&self) -> IngestionStatus;

    /// Persist a settings patch, restarting the pipeline when it is running.
    async fn reconfigure(&self, patch: Value) -> ConfigResult<Settings>;
}
