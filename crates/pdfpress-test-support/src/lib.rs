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

//! Shared test helpers used across the workspace.
//! Layout: fixtures.rs (sized PDF-like files, directory listings), wait.rs (polling).

pub mod fixtures;
pub mod wait;

pub use fixtures::{dir_names, temp_leftovers, write_pdf};
pub use wait::wait_until;
