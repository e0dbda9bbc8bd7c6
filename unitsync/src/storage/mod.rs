//! Persistent storage: session file and local layout

pub mod layout;
pub mod session;
