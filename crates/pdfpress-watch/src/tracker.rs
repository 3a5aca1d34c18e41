//! Stability bookkeeping for candidate files.
//!
//! A candidate is emitted once its `(len, mtime)` fingerprint has held for
//! the whole stability window. Emitted paths stay suppressed until they are
//! removed or recreated.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fingerprint {
    pub(crate) len: u64,
    pub(crate) modified: Option<SystemTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    File(Fingerprint),
    NotAFile,
    Gone,
}

#[derive(Debug)]
struct Pending {
    fingerprint: Option<Fingerprint>,
    stable_since: Instant,
}

#[derive(Debug)]
pub(crate) struct Tracker {
    window: Duration,
    pending: HashMap<PathBuf, Pending>,
    emitted: HashSet<PathBuf>,
}

impl Tracker {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
            emitted: HashSet::new(),
        }
    }

    /// Start tracking `path` unless it is already pending or emitted.
    pub(crate) fn observe(&mut self, path: PathBuf, now: Instant) {
        if self.emitted.contains(&path) {
            return;
        }
        self.pending.entry(path).or_insert(Pending {
            fingerprint: None,
            stable_since: now,
        });
    }

    /// `path` was created anew; a previous emission no longer suppresses it.
    pub(crate) fn recreated(&mut self, path: PathBuf, now: Instant) {
        self.emitted.remove(&path);
        self.observe(path, now);
    }

    /// `path` disappeared.
    pub(crate) fn forget(&mut self, path: &Path) {
        self.pending.remove(path);
        self.emitted.remove(path);
    }

    /// Paths still waiting to become stable.
    pub(crate) fn pending_paths(&self) -> Vec<PathBuf> {
        self.pending.keys().cloned().collect()
    }

    /// Re-probe every pending path and return those that became stable.
    pub(crate) fn poll<F>(&mut self, now: Instant, mut probe: F) -> Vec<PathBuf>
    where
        F: FnMut(&Path) -> Probe,
    {
        let mut ready = Vec::new();
        let mut dropped = Vec::new();

        for (path, pending) in &mut self.pending {
            match probe(path) {
                Probe::File(current) => {
                    if pending.fingerprint == Some(current) {
                        if now.saturating_duration_since(pending.stable_since) >= self.window {
                            ready.push(path.clone());
                        }
                    } else {
                        pending.fingerprint = Some(current);
                        pending.stable_since = now;
                    }
                }
                Probe::NotAFile | Probe::Gone => dropped.push(path.clone()),
            }
        }

        for path in &dropped {
            self.pending.remove(path);
        }
        for path in &ready {
            self.pending.remove(path);
            self.emitted.insert(path.clone());
        }
        ready.sort();
        ready
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(2_000);

    fn file(len: u64) -> Probe {
        Probe::File(Fingerprint {
            len,
            modified: None,
        })
    }

    #[test]
    fn emits_after_window_of_unchanged_fingerprint() {
        let start = Instant::now();
        let mut tracker = Tracker::new(WINDOW);
        tracker.observe(PathBuf::from("/in/a.pdf"), start);

        assert!(tracker.poll(start, |_| file(10)).is_empty());
        assert!(tracker.poll(start + Duration::from_millis(1_999), |_| file(10)).is_empty());
        assert_eq!(
            tracker.poll(start + WINDOW, |_| file(10)),
            vec![PathBuf::from("/in/a.pdf")]
        );
        assert_eq!(tracker.pending_len(), 0);
    }

    #[test]
    fn growth_restarts_the_window() {
        let start = Instant::now();
        let mut tracker = Tracker::new(WINDOW);
        tracker.observe(PathBuf::from("/in/a.pdf"), start);

        tracker.poll(start, |_| file(10));
        tracker.poll(start + Duration::from_millis(1_500), |_| file(20));
        assert!(tracker.poll(start + Duration::from_millis(3_000), |_| file(20)).is_empty());
        assert_eq!(
            tracker.poll(start + Duration::from_millis(3_500), |_| file(20)).len(),
            1
        );
    }

    #[test]
    fn emitted_paths_are_suppressed_until_recreated() {
        let start = Instant::now();
        let path = PathBuf::from("/in/a.pdf");
        let mut tracker = Tracker::new(Duration::ZERO);

        tracker.observe(path.clone(), start);
        tracker.poll(start, |_| file(1));
        assert_eq!(tracker.poll(start, |_| file(1)), vec![path.clone()]);

        tracker.observe(path.clone(), start);
        assert_eq!(tracker.pending_len(), 0);

        tracker.recreated(path.clone(), start);
        assert_eq!(tracker.pending_len(), 1);
    }

    #[test]
    fn forgotten_paths_become_eligible_again() {
        let start = Instant::now();
        let path = PathBuf::from("/in/a.pdf");
        let mut tracker = Tracker::new(Duration::ZERO);
        tracker.observe(path.clone(), start);
        tracker.poll(start, |_| file(1));
        tracker.poll(start, |_| file(1));

        tracker.forget(&path);
        tracker.observe(path, start);
        assert_eq!(tracker.pending_len(), 1);
    }

    #[test]
    fn vanished_or_non_file_paths_are_dropped() {
        let start = Instant::now();
        let mut tracker = Tracker::new(WINDOW);
        tracker.observe(PathBuf::from("/in/gone.pdf"), start);
        tracker.observe(PathBuf::from("/in/dir.pdf"), start);

        let ready = tracker.poll(start, |path| {
            if path.ends_with("gone.pdf") {
                Probe::Gone
            } else {
                Probe::NotAFile
            }
        });
        assert!(ready.is_empty());
        assert_eq!(tracker.pending_len(), 0);
    }
}
