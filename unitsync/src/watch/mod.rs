//! Local change detection

pub mod classifier;
pub mod session;
pub mod watcher;
