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

//! Directory monitor emitting one ingestion event per stable PDF.
//!
//! Layout: `monitor.rs` (backend wiring and task lifecycle), `tracker.rs`
//! (stability bookkeeping), `error.rs`.

pub mod error;
pub mod monitor;
mod tracker;

pub use error::{WatchError, WatchResult};
pub use monitor::{
    DEFAULT_POLL_INTERVAL, DEFAULT_STABILITY_WINDOW, DirectoryMonitor, IngestionEvent,
    MonitorConfig, MonitorHandle,
};
