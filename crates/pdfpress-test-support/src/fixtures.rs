//! Filesystem fixtures.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const PDF_HEADER: &[u8] = b"%PDF-1.4\n";
const TEMP_NAME_FRAGMENT: &str = "pdfpress-tmp";

/// Write a PDF-looking file of exactly `len` bytes (header first, then padding).
///
/// # Errors
///
/// Propagates filesystem errors.
pub fn write_pdf(dir: &Path, name: &str, len: usize) -> io::Result<PathBuf> {
    let path = dir.join(name);
    let mut body = PDF_HEADER.iter().copied().take(len).collect::<Vec<_>>();
    body.resize(len, b'x');
    fs::write(&path, body)?;
    Ok(path)
}

/// Sorted file names directly inside `dir`; empty when it does not exist.
#[must_use]
pub fn dir_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<_> = entries
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Temp artifacts left directly inside `dir`.
#[must_use]
pub fn temp_leftovers(dir: &Path) -> Vec<String> {
    dir_names(dir)
        .into_iter()
        .filter(|name| name.contains(TEMP_NAME_FRAGMENT))
        .collect()
}
