//! Recursive filesystem watcher over the units root

use std::path::{Path, PathBuf};

use notify::{
    event::{EventKind, ModifyKind},
    Event, RecommendedWatcher, RecursiveMode, Watcher,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use crate::errors::UnitError;

/// A file under the units root was created or written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChanged {
    pub path: PathBuf,
}

/// Events that may carry new file content
fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Name(_))
    )
}

/// Forwards write events under one root to a channel.
///
/// The watcher can be paused while the sync engine rewrites local files, so
/// bulk writes are not mistaken for edits.
pub struct UnitWatcher {
    watcher: RecommendedWatcher,
    root: Option<PathBuf>,
}

impl UnitWatcher {
    /// Create a watcher that is not yet watching anything
    pub fn new(sender: UnboundedSender<FileChanged>) -> Result<Self, UnitError> {
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            Self::handle_raw_event(res, &sender);
        })?;
        Ok(Self {
            watcher,
            root: None,
        })
    }

    fn handle_raw_event(res: notify::Result<Event>, sender: &UnboundedSender<FileChanged>) {
        match res {
            Ok(event) => {
                if !is_write(&event.kind) {
                    debug!("Ignoring event kind {:?}", event.kind);
                    return;
                }
                for path in event.paths {
                    let _ = sender.send(FileChanged { path });
                }
            }
            Err(e) => {
                error!("File system watcher error: {}", e);
            }
        }
    }

    /// Start watching `root` recursively
    pub fn watch(&mut self, root: &Path) -> Result<(), UnitError> {
        if self.root.as_deref() == Some(root) {
            return Ok(());
        }
        self.pause()?;
        self.watcher.watch(root, RecursiveMode::Recursive)?;
        info!("Watching {} for changes", root.display());
        self.root = Some(root.to_path_buf());
        Ok(())
    }

    /// Stop watching. Returns the root that was being watched.
    pub fn pause(&mut self) -> Result<Option<PathBuf>, UnitError> {
        let Some(root) = self.root.take() else {
            return Ok(None);
        };
        self.watcher.unwatch(&root)?;
        debug!("Paused watcher on {}", root.display());
        Ok(Some(root))
    }

    pub fn is_active(&self) -> bool {
        self.root.is_some()
    }
}
