//! Handler-level doubles shared by the HTTP tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use pdfpress_config::{ConfigResult, ConfigService, Settings, SettingsFacade};
use pdfpress_events::ActivityLog;
use pdfpress_telemetry::Metrics;
use serde_json::Value;
use tempfile::TempDir;

use crate::control::{IngestionControl, IngestionStatus};
use crate::state::ApiState;

pub(crate) struct StubControl {
    config: Arc<ConfigService>,
    running: AtomicBool,
    restarts: AtomicUsize,
    _dir: TempDir,
}

impl StubControl {
    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub(crate) fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IngestionControl for StubControl {
    async fn start(&self) -> bool {
        !self.running.swap(true, Ordering::SeqCst)
    }

    async fn stop(&self) -> bool {
        self.running.swap(false, Ordering::SeqCst)
    }

    async fn status(&self) -> IngestionStatus {
        IngestionStatus {
            running: self.running.load(Ordering::SeqCst),
            ..IngestionStatus::default()
        }
    }

    async fn reconfigure(&self, patch: Value) -> ConfigResult<Settings> {
        let saved = self.config.save(patch).await?;
        if self.running.load(Ordering::SeqCst) {
            self.restarts.fetch_add(1, Ordering::SeqCst);
        }
        Ok(saved)
    }
}

/// Fresh state backed by a config file in its own temp directory.
pub(crate) fn state() -> (Arc<ApiState>, Arc<StubControl>) {
    let dir = TempDir::new().expect("tempdir");
    let config = Arc::new(ConfigService::new(
        dir.path().join("config.json"),
        Settings::default(),
    ));
    let control = Arc::new(StubControl {
        config: Arc::clone(&config),
        running: AtomicBool::new(false),
        restarts: AtomicUsize::new(0),
        _dir: dir,
    });
    let state = Arc::new(ApiState::new(
        config,
        control.clone(),
        ActivityLog::new(),
        Metrics::new().expect("metrics"),
    ));
    (state, control)
}

