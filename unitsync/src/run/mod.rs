//! Remote execution and log streaming

pub mod logs;
pub mod runner;
pub mod urls;
