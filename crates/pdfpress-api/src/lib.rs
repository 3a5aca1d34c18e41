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

//! HTTP control surface for the ingestion pipeline.
//!
//! Layout: `control.rs` (the seam the application implements), `models.rs`
//! (wire DTOs), `state.rs` (shared handler state), `http/` (router, handlers,
//! errors, and middleware).

pub mod control;
pub mod http;
pub mod models;
pub mod state;

pub use control::{IngestionControl, IngestionStatus};
pub use http::router::ApiServer;
pub use models::{ActionResponse, ProblemDetails, ProblemInvalidParam, StatusResponse};
pub use state::ApiState;
