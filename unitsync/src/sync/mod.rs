//! Sync engine and drift reconciliation

pub mod reconciler;
pub mod syncer;
