//! File-change debouncing: pure timing and event deduplication.
//!
//! Collects raw notify events into a path-keyed map and releases them only
//! after a quiet window with no further events.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::collect::is_hidden_or_temp;

/// What happened to a watched path within one debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Pure debouncer: only timing and dedup, no business logic.
pub struct Debouncer {
    window: Duration,
    /// Path → ChangeKind (dedup is free via HashMap key uniqueness)
    changes: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window: Duration::from_millis(window_ms),
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Removed + Created/Modified → Created/Modified (file was restored)
    /// - Modified + Removed → Removed (file was deleted)
    /// - Created + Removed → discarded (appeared then vanished)
    /// - same kind: first event wins
    pub fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(modify) => {
                // Metadata-only changes (mtime/chmod noise) can cause
                // endless rebuild loops
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
                ChangeKind::Modified
            }
            _ => return,
        };

        for path in &event.paths {
            if is_hidden_or_temp(path) {
                continue;
            }
            self.record(path.clone(), kind);
        }
    }

    fn record(&mut self, path: PathBuf, kind: ChangeKind) {
        if let Some(&existing) = self.changes.get(&path) {
            match (existing, kind) {
                (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                    self.changes.insert(path, kind);
                }
                (ChangeKind::Modified, ChangeKind::Removed) => {
                    self.changes.insert(path, ChangeKind::Removed);
                }
                (ChangeKind::Created, ChangeKind::Removed) => {
                    self.changes.remove(&path);
                }
                _ => return, // first event wins, timer untouched
            }
        } else {
            crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
            self.changes.insert(path, kind);
        }
        self.last_event = Some(Instant::now());
    }

    /// Take accumulated changes if the quiet window has elapsed.
    pub fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        if !self.is_ready() {
            return None;
        }

        let changes = std::mem::take(&mut self.changes);
        self.last_event = None;

        if changes.is_empty() {
            return None;
        }
        Some(changes)
    }

    fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        last_event.elapsed() >= self.window && !self.changes.is_empty()
    }

    /// Precise sleep duration until the next possible ready time.
    pub fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };
        self.window
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: notify::EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    fn modify(path: &str) -> notify::Event {
        event(
            notify::EventKind::Modify(notify::event::ModifyKind::Data(
                notify::event::DataChange::Content,
            )),
            path,
        )
    }

    #[test]
    fn test_many_events_one_batch() {
        let mut debouncer = Debouncer::new(0);
        for _ in 0..10 {
            debouncer.add_event(&modify("/src/app.js"));
        }
        debouncer.add_event(&modify("/src/main.css"));

        // Window of 0 ms: ready immediately; all events in one batch
        let changes = debouncer.take_if_ready().unwrap();
        assert_eq!(changes.len(), 2);
        // And nothing left for a second batch
        assert!(debouncer.take_if_ready().is_none());
    }

    #[test]
    fn test_not_ready_within_window() {
        let mut debouncer = Debouncer::new(10_000);
        debouncer.add_event(&modify("/src/app.js"));
        assert!(debouncer.take_if_ready().is_none());
        assert!(debouncer.sleep_duration() > Duration::from_secs(1));
    }

    #[test]
    fn test_removed_then_restored_keeps_latest() {
        let mut debouncer = Debouncer::new(0);
        debouncer.add_event(&event(
            notify::EventKind::Remove(notify::event::RemoveKind::File),
            "/src/app.js",
        ));
        debouncer.add_event(&event(
            notify::EventKind::Create(notify::event::CreateKind::File),
            "/src/app.js",
        ));

        let changes = debouncer.take_if_ready().unwrap();
        assert_eq!(changes[&PathBuf::from("/src/app.js")], ChangeKind::Created);
    }

    #[test]
    fn test_created_then_removed_discards() {
        let mut debouncer = Debouncer::new(0);
        debouncer.add_event(&event(
            notify::EventKind::Create(notify::event::CreateKind::File),
            "/src/new.js",
        ));
        debouncer.add_event(&event(
            notify::EventKind::Remove(notify::event::RemoveKind::File),
            "/src/new.js",
        ));
        assert!(debouncer.take_if_ready().is_none());
    }

    #[test]
    fn test_temp_files_ignored() {
        let mut debouncer = Debouncer::new(0);
        debouncer.add_event(&modify("/src/app.js~"));
        debouncer.add_event(&modify("/src/.app.js.swp"));
        debouncer.add_event(&modify("/src/app.js.tmp"));
        assert!(debouncer.take_if_ready().is_none());
    }

    #[test]
    fn test_metadata_only_changes_ignored() {
        let mut debouncer = Debouncer::new(0);
        debouncer.add_event(&event(
            notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
                notify::event::MetadataKind::WriteTime,
            )),
            "/src/app.js",
        ));
        assert!(debouncer.take_if_ready().is_none());
    }
}
