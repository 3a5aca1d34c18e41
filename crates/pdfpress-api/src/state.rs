//! Shared handler state.

use std::sync::Arc;

use pdfpress_config::SettingsFacade;
use pdfpress_events::ActivityLog;
use pdfpress_telemetry::Metrics;

use crate::control::IngestionControl;

/// Dependencies every handler can reach.
#[derive(Clone)]
pub struct ApiState {
    pub(crate) config: Arc<dyn SettingsFacade>,
    pub(crate) control: Arc<dyn IngestionControl>,
    pub(crate) activity: ActivityLog,
    pub(crate) telemetry: Metrics,
}

impl ApiState {
    /// Bundle the handler dependencies.
    #[must_use]
    pub fn new(
        config: Arc<dyn SettingsFacade>,
        control: Arc<dyn IngestionControl>,
        activity: ActivityLog,
        telemetry: Metrics,
    ) -> Self {
        Self {
            config,
            control,
            activity,
            telemetry,
        }
    }
}
