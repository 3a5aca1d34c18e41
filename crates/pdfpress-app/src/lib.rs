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

//! pdfpress application wiring.
//!
//! Layout: `bootstrap.rs` (service wiring), `controller.rs` (ingestion
//! lifecycle and per-file dispatch), `error.rs`.

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Ingestion lifecycle.
pub mod controller;
/// Application-level errors.
pub mod error;

pub use bootstrap::{AppConfig, BIND_ENV, CONFIG_PATH_ENV, DEFAULT_BIND, Services, run_app};
pub use controller::{ControllerDeps, DEFAULT_SETTLE_DELAY, IngestionController};
pub use error::{AppError, AppResult};
