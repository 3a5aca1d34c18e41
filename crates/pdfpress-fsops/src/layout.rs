//! On-disk layout rules shared by the monitor, orchestrator, and relocator.
//!
//! # Design
//! - Finished sources move into sibling subtrees of their own directory.
//! - Anything under those subtrees, or carrying the temp marker, is never ingested.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

/// Subtree receiving sources whose compression succeeded.
pub const PROCESSED_DIR: &str = "_Processed";
/// Subtree receiving sources whose compression failed.
pub const FAILED_DIR: &str = "_Processed_Error";
/// Marker embedded in every temporary artifact name.
pub const TEMP_MARKER: &str = ".pdfpress-tmp";

/// Where a finished source file is moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationTarget {
    /// Compression produced an output.
    Processed,
    /// Compression raised an error.
    Failed,
}

impl RelocationTarget {
    /// Pick the target for a processing result.
    #[must_use]
    pub const fn for_result(succeeded: bool) -> Self {
        if succeeded {
            Self::Processed
        } else {
            Self::Failed
        }
    }

    /// Directory name of the subtree.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Processed => PROCESSED_DIR,
            Self::Failed => FAILED_DIR,
        }
    }

    /// Metric label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Failed => "failed",
        }
    }
}

/// True when `path` lives under a relocation subtree or names a temp artifact.
#[must_use]
pub fn should_ignore(path: &Path) -> bool {
    let in_subtree = path.components().any(|component| match component {
        Component::Normal(name) => {
            name == OsStr::new(PROCESSED_DIR) || name == OsStr::new(FAILED_DIR)
        }
        _ => false,
    });
    in_subtree
        || path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().contains(TEMP_MARKER))
}

/// Unique temp path `<stem>.pdfpress-tmp-<profile>-<uuid>.pdf` inside `dir`.
#[must_use]
pub fn temp_artifact_path(dir: &Path, stem: &str, profile: &str) -> PathBuf {
    dir.join(format!(
        "{stem}{TEMP_MARKER}-{profile}-{}.pdf",
        Uuid::new_v4().simple()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtree_members_are_ignored() {
        assert!(should_ignore(Path::new("/in/_Processed/a.pdf")));
        assert!(should_ignore(Path::new("/in/_Processed_Error/a.pdf")));
        assert!(should_ignore(Path::new("/in/_Processed")));
        assert!(!should_ignore(Path::new("/in/a.pdf")));
    }

    #[test]
    fn lookalike_names_are_not_ignored() {
        assert!(!should_ignore(Path::new("/in/_Processed_old/a.pdf")));
        assert!(!should_ignore(Path::new("/in/report_Processed.pdf")));
    }

    #[test]
    fn temp_artifacts_are_ignored() {
        let path = temp_artifact_path(Path::new("/out"), "report", "Standard");
        let name = path.file_name().expect("file name").to_string_lossy().into_owned();
        assert!(name.starts_with("report.pdfpress-tmp-Standard-"));
        assert!(name.ends_with(".pdf"));
        assert!(should_ignore(&path));
    }

    #[test]
    fn temp_paths_are_unique() {
        let dir = Path::new("/out");
        assert_ne!(
            temp_artifact_path(dir, "a", "Standard"),
            temp_artifact_path(dir, "a", "Standard")
        );
    }

    #[test]
    fn target_follows_result() {
        assert_eq!(RelocationTarget::for_result(true).dir_name(), PROCESSED_DIR);
        assert_eq!(RelocationTarget::for_result(false).dir_name(), FAILED_DIR);
    }
}
