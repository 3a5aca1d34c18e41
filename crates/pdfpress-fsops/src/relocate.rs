//! Relocation of finished source files and retrying copies.
//!
//! # Design
//! - Moving a source never fails the caller; problems land in the activity log.
//! - Lock-class errors are retried on a bounded schedule; anything else stops at once.
//! - Copies share the same retry discipline but return their error.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pdfpress_events::ActivityLog;
use pdfpress_telemetry::Metrics;
use tracing::instrument;

use crate::error::{FsOpsError, FsOpsResult};
use crate::layout::{FAILED_DIR, PROCESSED_DIR, RelocationTarget};
use crate::ops::{FileOps, TokioFileOps};
use crate::retry::{COPY_BASE_DELAY, RetryPolicy, is_lock_error, retry_with_backoff};

/// Result of [`Relocator::relocate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationOutcome {
    /// The source now lives at `destination`.
    Moved {
        /// Chosen subtree.
        target: RelocationTarget,
        /// New location of the file.
        destination: PathBuf,
    },
    /// The source was left in place.
    Abandoned {
        /// Subtree the file was meant for.
        target: RelocationTarget,
    },
}

/// Moves sources into the success or failure subtree.
#[derive(Clone)]
pub struct Relocator {
    ops: Arc<dyn FileOps>,
    log: ActivityLog,
    metrics: Metrics,
    move_policy: RetryPolicy,
    copy_base_delay: Duration,
}

impl Relocator {
    /// Relocator over the real filesystem.
    #[must_use]
    pub fn new(log: ActivityLog, metrics: Metrics) -> Self {
        Self::with_ops(Arc::new(TokioFileOps), log, metrics)
    }

    /// Relocator over a custom [`FileOps`] implementation.
    #[must_use]
    pub fn with_ops(ops: Arc<dyn FileOps>, log: ActivityLog, metrics: Metrics) -> Self {
        Self {
            ops,
            log,
            metrics,
            move_policy: RetryPolicy::RELOCATION,
            copy_base_delay: COPY_BASE_DELAY,
        }
    }

    /// Override the relocation retry schedule.
    #[must_use]
    pub fn with_move_policy(mut self, policy: RetryPolicy) -> Self {
        self.move_policy = policy;
        self
    }

    /// Override the delay unit of [`Relocator::copy_with_retry`].
    #[must_use]
    pub fn with_copy_base_delay(mut self, delay: Duration) -> Self {
        self.copy_base_delay = delay;
        self
    }

    /// Filesystem implementation in use.
    #[must_use]
    pub fn file_ops(&self) -> Arc<dyn FileOps> {
        Arc::clone(&self.ops)
    }

    /// Create both subtrees inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns the first directory creation failure.
    pub async fn ensure_subtrees(&self, dir: &Path) -> FsOpsResult<()> {
        for name in [PROCESSED_DIR, FAILED_DIR] {
            let subtree = dir.join(name);
            self.ops
                .create_dir_all(&subtree)
                .await
                .map_err(|err| FsOpsError::io("relocate.create_subtree", &subtree, err))?;
        }
        Ok(())
    }

    /// Move `path` into `_Processed` when `succeeded`, else `_Processed_Error`.
    ///
    /// Never fails; every problem is recorded in the activity log.
    #[instrument(
        name = "relocator.relocate",
        skip_all,
        fields(path = %path.display(), succeeded = succeeded)
    )]
    pub async fn relocate(&self, path: &Path, succeeded: bool) -> RelocationOutcome {
        let target = RelocationTarget::for_result(succeeded);
        let display_name = display_name(path);

        let Some(dir) = path.parent() else {
            self.abandon(format!(
                "Failed to move file {}: no parent directory",
                path.display()
            ));
            return RelocationOutcome::Abandoned { target };
        };
        if let Err(err) = self.ensure_subtrees(dir).await {
            self.abandon(format!(
                "Failed to create organization folders: {}",
                err.describe()
            ));
            return RelocationOutcome::Abandoned { target };
        }

        let destination = dir.join(target.dir_name()).join(&display_name);
        let policy = self.move_policy;
        let result = retry_with_backoff(
            &policy,
            is_lock_error,
            |err, attempt, delay| {
                self.log.warning(format!(
                    "{display_name} is locked ({err}); retrying move in {} ms \
                     (attempt {attempt}/{})",
                    delay.as_millis(),
                    policy.max_attempts
                ));
            },
            || self.ops.rename(path, &destination),
        )
        .await;

        match result {
            Ok(()) => {
                self.log.info(format!(
                    "File moved to {}: {display_name}",
                    target.dir_name()
                ));
                self.metrics.inc_relocation(target.label());
                RelocationOutcome::Moved {
                    target,
                    destination,
                }
            }
            Err(failure) if failure.exhausted => {
                self.abandon(format!(
                    "Failed to move file {} after {} attempts: {}",
                    path.display(),
                    failure.attempts,
                    failure.error
                ));
                RelocationOutcome::Abandoned { target }
            }
            Err(failure) => {
                self.abandon(format!(
                    "Failed to move file {}: {}",
                    path.display(),
                    failure.error
                ));
                RelocationOutcome::Abandoned { target }
            }
        }
    }

    /// Copy `src` over `dst`, retrying lock-class errors with exponential backoff.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::RetriesExhausted`] when the lock never clears, or
    /// [`FsOpsError::Io`] for any other failure.
    #[instrument(
        name = "relocator.copy",
        skip_all,
        fields(src = %src.display(), dst = %dst.display())
    )]
    pub async fn copy_with_retry(
        &self,
        src: &Path,
        dst: &Path,
        max_attempts: u32,
    ) -> FsOpsResult<u64> {
        let policy = RetryPolicy::copy(max_attempts).with_base_delay(self.copy_base_delay);
        let display_name = display_name(dst);
        retry_with_backoff(
            &policy,
            is_lock_error,
            |err, attempt, delay| {
                self.log.warning(format!(
                    "Copy to {display_name} blocked ({err}); retrying in {} ms \
                     (attempt {attempt}/{})",
                    delay.as_millis(),
                    policy.max_attempts
                ));
            },
            || self.ops.copy(src, dst),
        )
        .await
        .map_err(|failure| {
            if failure.exhausted {
                FsOpsError::RetriesExhausted {
                    operation: "copy",
                    path: dst.to_path_buf(),
                    attempts: failure.attempts,
                    source: failure.error,
                }
            } else {
                FsOpsError::io("copy", dst, failure.error)
            }
        })
    }

    fn abandon(&self, message: String) {
        self.log.error(message);
        self.metrics.inc_relocation("abandoned");
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use pdfpress_events::Severity;
    use pdfpress_test_support::write_pdf;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    const FAST: Duration = Duration::from_millis(1);

    /// Fails the first `remaining` renames and copies with `kind`.
    struct FlakyFileOps {
        remaining: AtomicU32,
        kind: io::ErrorKind,
        calls: AtomicU32,
    }

    impl FlakyFileOps {
        fn new(failures: u32, kind: io::ErrorKind) -> Self {
            Self {
                remaining: AtomicU32::new(failures),
                kind,
                calls: AtomicU32::new(0),
            }
        }

        fn trip(&self) -> io::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let failing = self
                .remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                Err(io::Error::from(self.kind))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl FileOps for FlakyFileOps {
        async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            self.trip()?;
            TokioFileOps.rename(from, to).await
        }

        async fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
            self.trip()?;
            TokioFileOps.copy(from, to).await
        }

        async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            TokioFileOps.create_dir_all(path).await
        }
    }

    fn relocator(ops: Arc<dyn FileOps>, log: &ActivityLog) -> Result<Relocator> {
        Ok(Relocator::with_ops(ops, log.clone(), Metrics::new()?)
            .with_move_policy(RetryPolicy::RELOCATION.with_base_delay(FAST))
            .with_copy_base_delay(FAST))
    }

    fn count(log: &ActivityLog, severity: Severity) -> usize {
        log.snapshot()
            .iter()
            .filter(|record| record.severity == severity)
            .count()
    }

    #[tokio::test]
    async fn success_moves_into_processed_and_creates_both_subtrees() -> Result<()> {
        let temp = TempDir::new()?;
        let source = write_pdf(temp.path(), "report.pdf", 64)?;
        let log = ActivityLog::new();
        let relocator = relocator(Arc::new(TokioFileOps), &log)?;

        let outcome = relocator.relocate(&source, true).await;

        let expected = temp.path().join(PROCESSED_DIR).join("report.pdf");
        assert_eq!(
            outcome,
            RelocationOutcome::Moved {
                target: RelocationTarget::Processed,
                destination: expected.clone(),
            }
        );
        assert!(expected.exists());
        assert!(!source.exists());
        assert!(temp.path().join(FAILED_DIR).is_dir());
        assert_eq!(log.snapshot()[0].message, "File moved to _Processed: report.pdf");
        Ok(())
    }

    #[tokio::test]
    async fn failure_moves_into_error_subtree() -> Result<()> {
        let temp = TempDir::new()?;
        let source = write_pdf(temp.path(), "broken.pdf", 16)?;
        let log = ActivityLog::new();
        let relocator = relocator(Arc::new(TokioFileOps), &log)?;

        relocator.relocate(&source, false).await;

        assert!(temp.path().join(FAILED_DIR).join("broken.pdf").exists());
        assert!(!temp.path().join(PROCESSED_DIR).join("broken.pdf").exists());
        Ok(())
    }

    #[tokio::test]
    async fn transient_lock_is_retried_until_it_clears() -> Result<()> {
        let temp = TempDir::new()?;
        let source = write_pdf(temp.path(), "locked.pdf", 16)?;
        let ops = Arc::new(FlakyFileOps::new(2, io::ErrorKind::PermissionDenied));
        let log = ActivityLog::new();
        let relocator = relocator(ops.clone(), &log)?;

        let outcome = relocator.relocate(&source, true).await;

        assert!(matches!(outcome, RelocationOutcome::Moved { .. }));
        assert_eq!(ops.calls.load(Ordering::SeqCst), 3);
        assert_eq!(count(&log, Severity::Warning), 2);
        assert_eq!(count(&log, Severity::Error), 0);
        Ok(())
    }

    #[tokio::test]
    async fn persistent_lock_is_swallowed_after_five_attempts() -> Result<()> {
        let temp = TempDir::new()?;
        let source = write_pdf(temp.path(), "stuck.pdf", 16)?;
        let ops = Arc::new(FlakyFileOps::new(u32::MAX, io::ErrorKind::PermissionDenied));
        let log = ActivityLog::new();
        let relocator = relocator(ops.clone(), &log)?;

        let outcome = relocator.relocate(&source, true).await;

        assert_eq!(
            outcome,
            RelocationOutcome::Abandoned {
                target: RelocationTarget::Processed
            }
        );
        assert_eq!(ops.calls.load(Ordering::SeqCst), 5);
        assert!(source.exists());
        assert_eq!(count(&log, Severity::Warning), 4);
        assert!(log.snapshot()[0].message.contains("after 5 attempts"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_source_fails_without_retry() -> Result<()> {
        let temp = TempDir::new()?;
        let log = ActivityLog::new();
        let relocator = relocator(Arc::new(TokioFileOps), &log)?;

        let outcome = relocator
            .relocate(&temp.path().join("gone.pdf"), false)
            .await;

        assert!(matches!(outcome, RelocationOutcome::Abandoned { .. }));
        assert_eq!(count(&log, Severity::Warning), 0);
        assert_eq!(count(&log, Severity::Error), 1);
        Ok(())
    }

    #[tokio::test]
    async fn copy_retries_then_succeeds() -> Result<()> {
        let temp = TempDir::new()?;
        let source = write_pdf(temp.path(), "in.pdf", 128)?;
        let dest = temp.path().join("out.pdf");
        let ops = Arc::new(FlakyFileOps::new(1, io::ErrorKind::ResourceBusy));
        let log = ActivityLog::new();
        let relocator = relocator(ops, &log)?;

        let copied = relocator.copy_with_retry(&source, &dest, 3).await?;

        assert_eq!(copied, 128);
        assert_eq!(std::fs::read(&dest)?, std::fs::read(&source)?);
        assert_eq!(count(&log, Severity::Warning), 1);
        Ok(())
    }

    #[tokio::test]
    async fn copy_reports_exhaustion() -> Result<()> {
        let temp = TempDir::new()?;
        let source = write_pdf(temp.path(), "in.pdf", 8)?;
        let ops = Arc::new(FlakyFileOps::new(u32::MAX, io::ErrorKind::PermissionDenied));
        let log = ActivityLog::new();
        let relocator = relocator(ops, &log)?;

        let err = relocator
            .copy_with_retry(&source, &temp.path().join("out.pdf"), 3)
            .await
            .expect_err("lock never clears");

        assert!(matches!(
            err,
            FsOpsError::RetriesExhausted { attempts: 3, .. }
        ));
        Ok(())
    }
}
