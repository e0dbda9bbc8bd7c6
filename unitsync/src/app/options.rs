//! Application configuration options

use std::time::Duration;

use crate::storage::layout::ConfigLayout;
use crate::watch::session::DEFAULT_DEBOUNCE;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Where the session file lives
    pub config: ConfigLayout,

    /// Minimum time between two actionable file events
    pub debounce: Duration,

    /// Timeout of buffered API requests
    pub http_timeout: Duration,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            config: ConfigLayout::default(),
            debounce: DEFAULT_DEBOUNCE,
            http_timeout: Duration::from_secs(30),
        }
    }
}
