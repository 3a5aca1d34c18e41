//! Ghostscript executable discovery.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Install locations probed in order when no override is configured.
pub const KNOWN_INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\gs\gs10.06.0\bin\gswin64c.exe",
    r"C:\Program Files\gs\gs10.06.0\bin\gswin64.exe",
    r"C:\Program Files\gs\gs10.05.0\bin\gswin64c.exe",
    "/usr/bin/gs",
    "/usr/local/bin/gs",
    "/opt/homebrew/bin/gs",
];

/// Command resolved through `PATH` when nothing else is found.
pub const FALLBACK_COMMAND: &str = if cfg!(windows) { "gswin64c" } else { "gs" };

/// Resolve the compressor executable.
///
/// A non-blank `override_path` wins; otherwise the first existing entry of
/// [`KNOWN_INSTALL_PATHS`], otherwise [`FALLBACK_COMMAND`].
#[must_use]
pub fn detect_ghostscript(override_path: Option<&str>) -> PathBuf {
    resolve(override_path, KNOWN_INSTALL_PATHS, |path| path.is_file())
}

fn resolve<F>(override_path: Option<&str>, candidates: &[&str], exists: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    if let Some(explicit) = override_path.map(str::trim).filter(|value| !value.is_empty()) {
        return PathBuf::from(explicit);
    }
    candidates
        .iter()
        .map(Path::new)
        .find(|candidate| exists(candidate))
        .map_or_else(
            || {
                debug!(command = FALLBACK_COMMAND, "no known install found; relying on PATH");
                PathBuf::from(FALLBACK_COMMAND)
            },
            Path::to_path_buf,
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_when_present() {
        let resolved = resolve(Some("  /opt/gs/bin/gs  "), KNOWN_INSTALL_PATHS, |_| true);
        assert_eq!(resolved, PathBuf::from("/opt/gs/bin/gs"));
    }

    #[test]
    fn blank_override_is_ignored() {
        let resolved = resolve(Some("   "), &["/a/gs", "/b/gs"], |path| path == Path::new("/b/gs"));
        assert_eq!(resolved, PathBuf::from("/b/gs"));
    }

    #[test]
    fn first_existing_candidate_is_chosen() {
        let resolved = resolve(None, &["/a/gs", "/b/gs"], |_| true);
        assert_eq!(resolved, PathBuf::from("/a/gs"));
    }

    #[test]
    fn falls_back_to_path_lookup() {
        assert_eq!(resolve(None, &["/a/gs"], |_| false), PathBuf::from(FALLBACK_COMMAND));
    }
}
