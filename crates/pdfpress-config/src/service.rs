//! JSON-file configuration service.
//!
//! # Design
//! - Readers get an owned snapshot of the current record.
//! - Saves hold the write lock through persistence so concurrent saves serialize.
//! - Saves merge a partial JSON object onto the current record, reject unknown
//!   keys, validate, then persist atomically (temp file + rename).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;
use crate::validate::validate_policy;

/// Abstraction over configuration backends used by the pipeline and the API.
#[async_trait]
pub trait SettingsFacade: Send + Sync {
    /// Snapshot of the current settings.
    async fn get(&self) -> Settings;

    /// Merge a partial settings document and persist the result.
    async fn save(&self, patch: Value) -> ConfigResult<Settings>;
}

/// Settings persisted as a pretty-printed JSON document.
#[derive(Clone)]
pub struct ConfigService {
    path: PathBuf,
    current: Arc<RwLock<Settings>>,
}

impl ConfigService {
    /// Construct a service around an explicit settings record without reading disk.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            path: path.into(),
            current: Arc::new(RwLock::new(settings)),
        }
    }

    /// Load settings from `path`, falling back to defaults when the file is
    /// missing, unreadable, or invalid.
    #[instrument(name = "config_service.load", skip_all)]
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let settings = match read_settings(&path).await {
            Ok(Some(settings)) => {
                info!(path = %path.display(), "configuration loaded");
                settings
            }
            Ok(None) => {
                info!(path = %path.display(), "no configuration file found; using defaults");
                Settings::default()
            }
            Err(err) => {
                error!(
                    path = %path.display(),
                    error = %err.describe(),
                    "failed to load configuration; using defaults"
                );
                Settings::default()
            }
        };
        Self::new(path, settings)
    }

    /// Location of the backing JSON document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, settings: &Settings) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| ConfigError::io("config.create_dir", parent, err))?;
        }

        let body = serde_json::to_vec_pretty(settings)
            .map_err(|err| ConfigError::json("config.serialize", err))?;
        let staging = staging_path(&self.path);
        fs::write(&staging, body)
            .await
            .map_err(|err| ConfigError::io("config.write", &staging, err))?;
        if let Err(err) = fs::rename(&staging, &self.path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(ConfigError::io("config.rename", &self.path, err));
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsFacade for ConfigService {
    async fn get(&self) -> Settings {
        self.current.read().await.clone()
    }

    async fn save(&self, patch: Value) -> ConfigResult<Settings> {
        let mut guard = self.current.write().await;
        let mut document = serde_json::to_value(&*guard)
            .map_err(|err| ConfigError::json("config.serialize", err))?;
        merge_patch(&mut document, &patch, "settings")?;

        let updated: Settings = serde_json::from_value(document)
            .map_err(|err| ConfigError::json("config.deserialize", err))?;
        validate_policy(&updated.policy)?;

        self.persist(&updated).await?;
        *guard = updated.clone();
        drop(guard);

        info!(path = %self.path.display(), "configuration saved");
        Ok(updated)
    }
}

async fn read_settings(path: &Path) -> ConfigResult<Option<Settings>> {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(ConfigError::io("config.read", path, err)),
    };
    let settings: Settings =
        serde_json::from_str(&text).map_err(|err| ConfigError::json("config.parse", err))?;
    if let Err(err) = validate_policy(&settings.policy) {
        warn!(error = %err.describe(), "stored compression policy is invalid");
        return Err(err);
    }
    Ok(Some(settings))
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "config".into(), |name| name.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple()))
}

/// Overlay `patch` onto `target`, recursing into nested objects.
fn merge_patch(target: &mut Value, patch: &Value, section: &str) -> ConfigResult<()> {
    let Value::Object(patch_map) = patch else {
        return Err(ConfigError::invalid(
            "settings",
            section,
            Some(patch.to_string()),
            "must_be_object",
        ));
    };
    let Value::Object(target_map) = target else {
        return Err(ConfigError::invalid(
            "settings",
            section,
            None,
            "not_an_object",
        ));
    };

    for (key, value) in patch_map {
        let Some(slot) = target_map.get_mut(key) else {
            return Err(ConfigError::UnknownField {
                section: section.to_string(),
                field: key.clone(),
            });
        };
        if slot.is_object() && value.is_object() {
            merge_patch(slot, value, key)?;
        } else {
            *slot = value.clone();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DownsampleMethod;
    use anyhow::Result;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let temp = TempDir::new().expect("tempdir");
        let service = ConfigService::load(temp.path().join("config.json")).await;
        assert_eq!(service.get().await, Settings::default());
    }

    #[tokio::test]
    async fn corrupt_file_yields_defaults() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("config.json");
        std::fs::write(&path, b"{ not json")?;
        let service = ConfigService::load(&path).await;
        assert_eq!(service.get().await, Settings::default());
        Ok(())
    }

    #[tokio::test]
    async fn save_merges_nested_patch_and_persists() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("nested").join("config.json");
        let service = ConfigService::load(&path).await;

        let updated = service
            .save(json!({
                "source_path": "/in",
                "policy": { "color": { "downsample": "subsample" } }
            }))
            .await?;
        assert_eq!(updated.source_path, "/in");
        assert_eq!(updated.policy.color.downsample, DownsampleMethod::Subsample);
        assert_eq!(updated.policy.color.resolution, 115);

        let reloaded = ConfigService::load(&path).await;
        assert_eq!(reloaded.get().await, updated);

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().expect("parent"))?
            .flatten()
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "staging file should be renamed away");
        Ok(())
    }

    #[tokio::test]
    async fn save_rejects_unknown_fields() {
        let temp = TempDir::new().expect("tempdir");
        let service = ConfigService::load(temp.path().join("config.json")).await;
        let err = service
            .save(json!({ "policy": { "quality": "/ebook" } }))
            .await
            .expect_err("unknown field must be rejected");
        assert!(matches!(
            err,
            ConfigError::UnknownField { ref section, ref field }
                if section == "policy" && field == "quality"
        ));
        assert_eq!(service.get().await, Settings::default());
    }

    #[tokio::test]
    async fn save_rejects_invalid_policy_without_persisting() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.json");
        let service = ConfigService::load(&path).await;
        let result = service
            .save(json!({ "policy": { "color": { "resolution": 0 } } }))
            .await;
        assert!(matches!(result, Err(ConfigError::InvalidField { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn merge_patch_requires_object() {
        let mut target = serde_json::to_value(Settings::default()).expect("serialize");
        let err = merge_patch(&mut target, &json!(["x"]), "settings")
            .expect_err("array patch must fail");
        assert!(matches!(err, ConfigError::InvalidField { reason: "must_be_object", .. }));
        let mut untouched = serde_json::to_value(Settings::default()).expect("serialize");
        assert!(merge_patch(&mut untouched, &json!({}), "settings").is_ok());
    }
}
