//! External process execution for a single compression attempt.
//!
//! # Design
//! - No shell: the executable receives an argv vector.
//! - stdout is discarded; stderr is captured for diagnostics.
//! - Failures are data (`AttemptResult`), never errors; the orchestrator
//!   decides what to do with them.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::sleep;
use tracing::{debug, instrument};

use crate::profile::ProfileKind;

/// Pause between a clean exit and inspecting the output file.
pub const DEFAULT_GRACE_DELAY: Duration = Duration::from_millis(500);

/// Why an attempt produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolFailure {
    /// The executable could not be started.
    Spawn {
        /// OS error text.
        message: String,
    },
    /// The process exited unsuccessfully.
    Exit {
        /// Exit code, absent when killed by a signal.
        code: Option<i32>,
        /// Trimmed stderr output.
        stderr: String,
    },
    /// The process reported success but left no output file, or an empty one.
    MissingOutput,
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { message } => write!(f, "failed to start compressor: {message}"),
            Self::Exit { code, stderr } => {
                match code {
                    Some(code) => write!(f, "exit code {code}")?,
                    None => f.write_str("terminated by signal")?,
                }
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
            Self::MissingOutput => f.write_str("compressor exited cleanly without usable output"),
        }
    }
}

/// What an attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    /// Output written with the given size in bytes.
    Produced {
        /// Output size in bytes.
        size: u64,
    },
    /// No usable output.
    Failed(ToolFailure),
}

/// Result of one compressor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    /// Profile that was attempted.
    pub profile: ProfileKind,
    /// What the run produced.
    pub status: AttemptStatus,
}

impl AttemptResult {
    /// Successful run with an output of `size` bytes.
    #[must_use]
    pub const fn produced(profile: ProfileKind, size: u64) -> Self {
        Self {
            profile,
            status: AttemptStatus::Produced { size },
        }
    }

    /// Failed run.
    #[must_use]
    pub const fn failed(profile: ProfileKind, failure: ToolFailure) -> Self {
        Self {
            profile,
            status: AttemptStatus::Failed(failure),
        }
    }

    /// Whether the run produced an output file.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.status, AttemptStatus::Produced { .. })
    }

}

/// Runs the compressor once.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Execute `command` with `args`, expecting it to write `output`.
    async fn invoke(
        &self,
        profile: ProfileKind,
        command: &Path,
        args: &[OsString],
        output: &Path,
    ) -> AttemptResult;
}

/// [`ToolInvoker`] spawning a real child process.
#[derive(Debug, Clone, Copy)]
pub struct GhostscriptInvoker {
    grace: Duration,
}

impl GhostscriptInvoker {
    /// Invoker with [`DEFAULT_GRACE_DELAY`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_grace(DEFAULT_GRACE_DELAY)
    }

    /// Invoker with a custom grace delay.
    #[must_use]
    pub const fn with_grace(grace: Duration) -> Self {
        Self { grace }
    }
}

impl Default for GhostscriptInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolInvoker for GhostscriptInvoker {
    #[instrument(
        name = "compressor.invoke",
        skip_all,
        fields(profile = profile.label(), command = %command.display())
    )]
    async fn invoke(
        &self,
        profile: ProfileKind,
        command: &Path,
        args: &[OsString],
        output: &Path,
    ) -> AttemptResult {
        let run = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let run = match run {
            Ok(run) => run,
            Err(err) => {
                return AttemptResult::failed(
                    profile,
                    ToolFailure::Spawn {
                        message: err.to_string(),
                    },
                );
            }
        };

        if !run.status.success() {
            let stderr = String::from_utf8_lossy(&run.stderr).trim().to_string();
            debug!(code = ?run.status.code(), "compressor exited unsuccessfully");
            return AttemptResult::failed(
                profile,
                ToolFailure::Exit {
                    code: run.status.code(),
                    stderr,
                },
            );
        }

        if !self.grace.is_zero() {
            sleep(self.grace).await;
        }
        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {
                AttemptResult::produced(profile, meta.len())
            }
            _ => AttemptResult::failed(profile, ToolFailure::MissingOutput),
        }
    }
}
