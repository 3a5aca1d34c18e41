//! Two-attempt compression policy for one input file.
//!
//! # Design
//! - `Standard` first, `RGBFallback` second, original copied last. A result is
//!   accepted only when strictly smaller than the input.
//! - Temp artifacts live next to the final output and are removed on every
//!   exit path; a drop guard covers cancellation.
//! - Tool failures fall through to the next attempt. Filesystem failures
//!   abort the file after cleanup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pdfpress_config::CompressionPolicy;
use pdfpress_events::ActivityLog;
use pdfpress_fsops::{Relocator, temp_artifact_path};
use pdfpress_telemetry::Metrics;
use tokio::fs;
use tracing::{debug, instrument};

use crate::error::{CompressError, CompressResult};
use crate::invoker::{AttemptStatus, ToolInvoker};
use crate::outcome::CompressionOutcome;
use crate::profile::{ProfileKind, build_args};

/// Attempts allowed when copying an artifact into place.
pub const DEFAULT_COPY_ATTEMPTS: u32 = 3;

/// Inputs for one processing call.
#[derive(Debug, Clone, Copy)]
pub struct CompressionRequest<'a> {
    /// Source PDF.
    pub input: &'a Path,
    /// Where the accepted artifact is written.
    pub final_output: &'a Path,
    /// Policy snapshot for this file.
    pub policy: &'a CompressionPolicy,
    /// Compressor executable.
    pub tool: &'a Path,
}

/// Drives the compressor over one file at a time.
#[derive(Clone)]
pub struct CompressionOrchestrator {
    invoker: Arc<dyn ToolInvoker>,
    relocator: Relocator,
    log: ActivityLog,
    metrics: Metrics,
    copy_attempts: u32,
}

impl CompressionOrchestrator {
    /// Construct an orchestrator; `relocator` supplies retrying copies.
    #[must_use]
    pub fn new(
        invoker: Arc<dyn ToolInvoker>,
        relocator: Relocator,
        log: ActivityLog,
        metrics: Metrics,
    ) -> Self {
        Self {
            invoker,
            relocator,
            log,
            metrics,
            copy_attempts: DEFAULT_COPY_ATTEMPTS,
        }
    }

    /// Override the copy attempt budget.
    #[must_use]
    pub const fn with_copy_attempts(mut self, attempts: u32) -> Self {
        self.copy_attempts = attempts;
        self
    }

    /// Compress `request.input` into `request.final_output`.
    ///
    /// # Errors
    ///
    /// Returns an error when the input cannot be read, the destination cannot
    /// be created, or the final copy fails. Temp artifacts are removed first.
    #[instrument(
        name = "orchestrator.process",
        skip_all,
        fields(input = %request.input.display())
    )]
    pub async fn process(
        &self,
        request: CompressionRequest<'_>,
    ) -> CompressResult<CompressionOutcome> {
        if request.input == request.final_output {
            return Err(CompressError::InvalidRequest {
                field: "final_output",
                reason: "same_as_input",
            });
        }

        let original_size = fs::metadata(request.input)
            .await
            .map_err(|err| CompressError::io("stat_input", request.input, err))?
            .len();

        let dest_dir = request
            .final_output
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        self.relocator
            .file_ops()
            .create_dir_all(dest_dir)
            .await
            .map_err(|err| CompressError::io("create_destination", dest_dir, err))?;
        if aliases_input(request.input, dest_dir, request.final_output).await {
            return Err(CompressError::InvalidRequest {
                field: "final_output",
                reason: "same_as_input",
            });
        }

        let mut temps = TempArtifacts::default();
        let result = self
            .run_attempts(&request, dest_dir, original_size, &mut temps)
            .await;
        temps.cleanup().await;

        if let Ok(outcome) = &result {
            self.metrics.inc_file_processed(outcome.profile.label());
        }
        result
    }

    async fn run_attempts(
        &self,
        request: &CompressionRequest<'_>,
        dest_dir: &Path,
        original_size: u64,
        temps: &mut TempArtifacts,
    ) -> CompressResult<CompressionOutcome> {
        let name = file_label(request.input);
        let stem = request
            .final_output
            .file_stem()
            .map_or_else(|| "output".to_string(), |stem| stem.to_string_lossy().into_owned());

        for kind in ProfileKind::ATTEMPT_ORDER {
            let temp = temp_artifact_path(dest_dir, &stem, kind.label());
            temps.track(temp.clone());

            self.log.info(format!("Starting {kind} compression: {name}"));
            let args = build_args(request.policy, kind, request.input, &temp);
            let attempt = self.invoker.invoke(kind, request.tool, &args, &temp).await;

            match attempt.status {
                AttemptStatus::Produced { size: 0 } => {
                    self.metrics.inc_tool_attempt(kind.label(), "failed");
                    self.log
                        .warning(format!("{kind} produced an empty file for {name}"));
                }
                AttemptStatus::Produced { size } if size < original_size => {
                    self.metrics.inc_tool_attempt(kind.label(), "reduced");
                    self.place(&temp, request.final_output).await?;
                    let outcome = CompressionOutcome::compressed(kind, original_size, size);
                    self.log.success(format!(
                        "{kind} compressed {name}: {original_size} -> {size} bytes ({}% smaller)",
                        outcome.reduction_label()
                    ));
                    return Ok(outcome);
                }
                AttemptStatus::Produced { size } => {
                    self.metrics.inc_tool_attempt(kind.label(), "no_reduction");
                    self.log.warning(format!(
                        "{kind} did not reduce {name} ({size} bytes vs {original_size} original)"
                    ));
                }
                AttemptStatus::Failed(failure) => {
                    self.metrics.inc_tool_attempt(kind.label(), "failed");
                    self.log
                        .warning(format!("{kind} compression failed for {name}: {failure}"));
                }
            }
            temps.discard(&temp).await;
        }

        self.place(request.input, request.final_output).await?;
        self.log.info(format!(
            "No profile reduced {name}; original kept unchanged ({original_size} bytes)"
        ));
        Ok(CompressionOutcome::irreducible(original_size))
    }

    async fn place(&self, from: &Path, to: &Path) -> CompressResult<()> {
        self.relocator
            .copy_with_retry(from, to, self.copy_attempts)
            .await
            .map(|_| ())
            .map_err(|source| CompressError::Copy {
                from: from.to_path_buf(),
                source,
            })
    }
}

/// Whether `final_output` names the input file through a different spelling
/// of the same directory.
async fn aliases_input(input: &Path, dest_dir: &Path, final_output: &Path) -> bool {
    if input.file_name() != final_output.file_name() {
        return false;
    }
    let Some(input_dir) = input.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
        return false;
    };
    match (fs::canonicalize(input_dir).await, fs::canonicalize(dest_dir).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Temp files owned by one processing call.
#[derive(Default)]
struct TempArtifacts {
    paths: Vec<PathBuf>,
}

impl TempArtifacts {
    fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    async fn discard(&mut self, path: &Path) {
        remove_quietly(path).await;
        self.paths.retain(|tracked| tracked != path);
    }

    async fn cleanup(&mut self) {
        for path in std::mem::take(&mut self.paths) {
            remove_quietly(&path).await;
        }
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        for path in &self.paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(err) = fs::remove_file(path).await
        && err.kind() != std::io::ErrorKind::NotFound
    {
        debug!(path = %path.display(), error = %err, "temp artifact removal failed");
    }
}
