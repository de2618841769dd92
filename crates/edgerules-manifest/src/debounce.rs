//! Change coalescing for the development watcher.
//!
//! Editors typically emit several filesystem events per save; recompiling on
//! each would thrash. Changes are held per path until a quiet-period
//! deadline passes, with overlapping kinds coalesced.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::watch::{ChangeEvent, ChangeKind};

struct PendingChange {
    kind: ChangeKind,
    deadline: Instant,
}

/// Thread-safe change debouncer keyed by path.
pub(crate) struct ChangeDebouncer {
    pending: Mutex<HashMap<PathBuf, PendingChange>>,
    quiet_period: Duration,
}

impl ChangeDebouncer {
    pub(crate) fn new(quiet_period: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            quiet_period,
        }
    }

    /// Record a raw change; safe to call from watcher callbacks.
    pub(crate) fn record(&self, path: PathBuf, kind: ChangeKind) {
        use std::collections::hash_map::Entry;

        let mut pending = self.pending.lock().unwrap();
        let deadline = Instant::now() + self.quiet_period;

        match pending.entry(path) {
            Entry::Vacant(entry) => {
                entry.insert(PendingChange { kind, deadline });
            }
            Entry::Occupied(mut entry) => {
                if let Some(kind) = Self::coalesce(entry.get().kind, kind) {
                    entry.get_mut().kind = kind;
                    entry.get_mut().deadline = deadline;
                } else {
                    // Created followed by Removed: the file never existed
                    // as far as consumers are concerned.
                    entry.remove();
                }
            }
        }
    }

    /// Merge two change kinds for the same path; `None` discards both.
    #[allow(clippy::match_same_arms)]
    fn coalesce(existing: ChangeKind, new: ChangeKind) -> Option<ChangeKind> {
        use ChangeKind::{Created, Modified, Removed};

        match (existing, new) {
            (Created, Created) => Some(Created),
            (Created, Modified) => Some(Created),
            (Created, Removed) => None,

            (Modified, Created) => Some(Created),
            (Modified, Modified) => Some(Modified),
            (Modified, Removed) => Some(Removed),

            (Removed, Created) => Some(Modified),
            (Removed, Modified) => Some(Removed),
            (Removed, Removed) => Some(Removed),
        }
    }

    /// Take all changes whose quiet period has elapsed.
    pub(crate) fn drain_ready(&self) -> Vec<ChangeEvent> {
        let mut pending = self.pending.lock().unwrap();
        let now = Instant::now();

        let ready: Vec<PathBuf> = pending
            .iter()
            .filter(|(_, change)| change.deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();

        ready
            .into_iter()
            .map(|path| {
                let change = pending.remove(&path).expect("path was just found");
                ChangeEvent {
                    path,
                    kind: change.kind,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_change_emitted_after_quiet_period() {
        let debouncer = ChangeDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("pages/about.tsx");

        debouncer.record(path.clone(), ChangeKind::Modified);
        assert!(debouncer.drain_ready().is_empty());

        thread::sleep(Duration::from_millis(15));

        let events = debouncer.drain_ready();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path, path);
        assert!(debouncer.drain_ready().is_empty());
    }

    #[test]
    fn test_repeated_saves_coalesce() {
        let debouncer = ChangeDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("pages/about.tsx");

        debouncer.record(path.clone(), ChangeKind::Modified);
        debouncer.record(path.clone(), ChangeKind::Modified);
        debouncer.record(path, ChangeKind::Modified);

        thread::sleep(Duration::from_millis(15));

        let events = debouncer.drain_ready();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::Modified);
    }

    #[test]
    fn test_create_then_remove_discards_both() {
        let debouncer = ChangeDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("pages/new.tsx");

        debouncer.record(path.clone(), ChangeKind::Created);
        debouncer.record(path, ChangeKind::Removed);

        thread::sleep(Duration::from_millis(15));

        assert!(debouncer.drain_ready().is_empty());
    }

    #[test]
    fn test_remove_then_create_becomes_modified() {
        let debouncer = ChangeDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("pages/about.tsx");

        debouncer.record(path.clone(), ChangeKind::Removed);
        debouncer.record(path, ChangeKind::Created);

        thread::sleep(Duration::from_millis(15));

        let events = debouncer.drain_ready();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::Modified);
    }

    #[test]
    fn test_coalesce_matrix() {
        use ChangeKind::{Created, Modified, Removed};

        assert_eq!(ChangeDebouncer::coalesce(Created, Created), Some(Created));
        assert_eq!(ChangeDebouncer::coalesce(Created, Modified), Some(Created));
        assert_eq!(ChangeDebouncer::coalesce(Created, Removed), None);
        assert_eq!(ChangeDebouncer::coalesce(Modified, Created), Some(Created));
        assert_eq!(
            ChangeDebouncer::coalesce(Modified, Modified),
            Some(Modified)
        );
        assert_eq!(ChangeDebouncer::coalesce(Modified, Removed), Some(Removed));
        assert_eq!(ChangeDebouncer::coalesce(Removed, Created), Some(Modified));
        assert_eq!(ChangeDebouncer::coalesce(Removed, Modified), Some(Removed));
        assert_eq!(ChangeDebouncer::coalesce(Removed, Removed), Some(Removed));
    }

    #[test]
    fn test_paths_are_independent() {
        let debouncer = ChangeDebouncer::new(Duration::from_millis(10));

        debouncer.record(PathBuf::from("a.tsx"), ChangeKind::Modified);
        debouncer.record(PathBuf::from("b.tsx"), ChangeKind::Created);

        thread::sleep(Duration::from_millis(15));

        assert_eq!(debouncer.drain_ready().len(), 2);
    }
}
