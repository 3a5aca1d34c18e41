#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Filesystem helpers for the ingestion pipeline.
//!
//! Layout: `layout.rs` (subtree names, ignore rules, temp naming), `retry.rs`
//! (bounded retry combinator), `ops.rs` (`FileOps` seam), `relocate.rs`
//! (`Relocator`), `error.rs`.

pub mod error;
pub mod layout;
pub mod ops;
pub mod relocate;
pub mod retry;

pub use error::{FsOpsError, FsOpsResult};
pub use layout::{
    FAILED_DIR, PROCESSED_DIR, RelocationTarget, TEMP_MARKER, should_ignore, temp_artifact_path,
};
pub use ops::{FileOps, TokioFileOps};
pub use relocate::{RelocationOutcome, Relocator};
pub use retry::{
    Backoff, COPY_BASE_DELAY, RetryFailure, RetryPolicy, is_lock_error, retry_with_backoff,
};
