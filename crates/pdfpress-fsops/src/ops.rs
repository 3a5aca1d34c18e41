//! Filesystem seam used by the relocator and the orchestrator.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

/// Primitive filesystem operations that may hit transient locks.
#[async_trait]
pub trait FileOps: Send + Sync {
    /// Rename `from` to `to`, replacing `to` if it exists.
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Copy `from` over `to`, returning the bytes copied.
    async fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Create `path` and any missing parents.
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// [`FileOps`] backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileOps;

#[async_trait]
impl FileOps for TokioFileOps {
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to).await
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path).await
    }
}
