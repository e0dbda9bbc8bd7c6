//! Change-detection state shared by the sync engine and the watch loop

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Minimum time between two actionable file events
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(3);

/// Ordered set of file paths that belong to materialized units
#[derive(Debug, Default)]
pub struct WatchRegistry {
    paths: RwLock<Vec<PathBuf>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path. Returns `false` if it was already registered.
    pub fn register(&self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        let mut paths = self.paths.write().unwrap_or_else(|e| e.into_inner());
        if paths.contains(&path) {
            return false;
        }
        paths.push(path);
        true
    }

    /// Remove a path. Returns `false` if it was not registered.
    pub fn deregister(&self, path: &Path) -> bool {
        let mut paths = self.paths.write().unwrap_or_else(|e| e.into_inner());
        let before = paths.len();
        paths.retain(|p| p != path);
        paths.len() != before
    }

    pub fn contains(&self, path: &Path) -> bool {
        let paths = self.paths.read().unwrap_or_else(|e| e.into_inner());
        paths.iter().any(|p| p == path)
    }

    /// Snapshot of the registered paths, in registration order
    pub fn paths(&self) -> Vec<PathBuf> {
        let paths = self.paths.read().unwrap_or_else(|e| e.into_inner());
        paths.clone()
    }

    pub fn len(&self) -> usize {
        let paths = self.paths.read().unwrap_or_else(|e| e.into_inner());
        paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One async mutex per unit name, so updates of the same unit run one at a
/// time while different units proceed independently.
#[derive(Debug, Default)]
pub struct UnitLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl UnitLocks {
    /// Wait for exclusive access to `unit`
    pub async fn lock(&self, unit: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(unit.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Watch registry, debounce clock and per-unit locks of one process
#[derive(Debug)]
pub struct SyncSession {
    registry: WatchRegistry,
    last_event: Mutex<Option<i64>>,
    debounce: Duration,
    locks: UnitLocks,
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl SyncSession {
    pub fn new(debounce: Duration) -> Self {
        Self {
            registry: WatchRegistry::new(),
            last_event: Mutex::new(None),
            debounce,
            locks: UnitLocks::default(),
        }
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    pub fn locks(&self) -> &UnitLocks {
        &self.locks
    }

    /// Decide whether an event on `path` should be acted on, now.
    pub fn is_actionable(&self, path: &Path) -> bool {
        self.is_actionable_at(path, Utc::now().timestamp())
    }

    /// Decide whether an event on `path` at second `now` should be acted on.
    ///
    /// Only registered paths qualify, and only if the debounce window has
    /// passed since the last actionable event on any path. A `true` answer
    /// moves the debounce clock to `now`.
    pub fn is_actionable_at(&self, path: &Path, now: i64) -> bool {
        if !self.registry.contains(path) {
            return false;
        }
        let mut last_event = self.last_event.lock().unwrap_or_else(|e| e.into_inner());
        let window = self.debounce.as_secs() as i64;
        if let Some(last) = *last_event {
            if now - last < window {
                debug!("Debounced event on {}", path.display());
                return false;
            }
        }
        *last_event = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(paths: &[&str]) -> SyncSession {
        let session = SyncSession::default();
        for p in paths {
            session.registry().register(*p);
        }
        session
    }

    #[test]
    fn test_unregistered_path_never_actionable() {
        let session = session_with(&["/units/a/index.js"]);
        assert!(!session.is_actionable_at(Path::new("/units/b/index.js"), 0));
        assert!(!session.is_actionable_at(Path::new("/units/b/index.js"), 1_000));
    }

    #[test]
    fn test_debounce_is_global() {
        let session = session_with(&["/units/a/index.js", "/units/b/readme.md"]);
        assert!(session.is_actionable_at(Path::new("/units/a/index.js"), 100));
        assert!(!session.is_actionable_at(Path::new("/units/b/readme.md"), 101));
        assert!(!session.is_actionable_at(Path::new("/units/a/index.js"), 102));
        assert!(session.is_actionable_at(Path::new("/units/b/readme.md"), 103));
    }

    #[test]
    fn test_rejected_event_does_not_move_clock() {
        let session = session_with(&["/units/a/index.js"]);
        assert!(session.is_actionable_at(Path::new("/units/a/index.js"), 10));
        assert!(!session.is_actionable_at(Path::new("/units/a/index.js"), 12));
        assert!(session.is_actionable_at(Path::new("/units/a/index.js"), 13));
    }

    #[test]
    fn test_registry_keeps_order_and_dedupes() {
        let registry = WatchRegistry::new();
        assert!(registry.register("/b"));
        assert!(registry.register("/a"));
        assert!(!registry.register("/b"));
        assert_eq!(registry.paths(), vec![PathBuf::from("/b"), PathBuf::from("/a")]);
        assert!(registry.deregister(Path::new("/b")));
        assert!(!registry.contains(Path::new("/b")));
    }

    #[tokio::test]
    async fn test_unit_lock_serializes_same_unit() {
        let locks = UnitLocks::default();
        let guard = locks.lock("hello").await;
        let other = locks.lock("world").await;
        drop(other);

        let waiting = tokio::time::timeout(Duration::from_millis(50), locks.lock("hello")).await;
        assert!(waiting.is_err());

        drop(guard);
        let acquired = tokio::time::timeout(Duration::from_millis(50), locks.lock("hello")).await;
        assert!(acquired.is_ok());
    }
}
