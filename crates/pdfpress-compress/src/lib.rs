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

//! Dual-pass PDF compression through an external Ghostscript process.
//!
//! Layout: `profile.rs` (argument builder), `invoker.rs` (process execution),
//! `detect.rs` (executable discovery), `outcome.rs` (result model),
//! `orchestrator.rs` (attempt policy and temp-file lifecycle), `error.rs`.

pub mod detect;
pub mod error;
pub mod invoker;
pub mod orchestrator;
pub mod outcome;
pub mod profile;

pub use detect::{FALLBACK_COMMAND, KNOWN_INSTALL_PATHS, detect_ghostscript};
pub use error::{CompressError, CompressResult};
pub use invoker::{
    AttemptResult, AttemptStatus, DEFAULT_GRACE_DELAY, GhostscriptInvoker, ToolFailure,
    ToolInvoker,
};
pub use orchestrator::{CompressionOrchestrator, CompressionRequest, DEFAULT_COPY_ATTEMPTS};
pub use outcome::{CompressionOutcome, OutcomeProfile, reduction_percent};
pub use profile::{ProfileKind, build_args, downsample_type};
