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

//! File-backed configuration for the PDF ingestion pipeline.
//!
//! Layout: `model.rs` (typed settings and compression policy), `validate.rs`
//! (validation helpers), `service.rs` (`ConfigService` + `SettingsFacade`).

pub mod defaults;
pub mod error;
pub mod model;
pub mod service;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::{ChannelPolicy, CompressionPolicy, DownsampleMethod, PdfPreset, Settings};
pub use service::{ConfigService, SettingsFacade};
pub use validate::{validate_policy, validate_for_start};
