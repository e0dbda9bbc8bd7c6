//! unitsync library
//!
//! Mirrors a user's UnitCluster units to a local directory, watches the
//! mirrored files and pushes edits back.

pub mod app;
pub mod codec;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod run;
pub mod storage;
pub mod store;
pub mod sync;
pub mod utils;
pub mod watch;
