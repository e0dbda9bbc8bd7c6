//! Application state management

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::app::options::AppOptions;
use crate::errors::UnitError;
use crate::filesys::dir::Dir;
use crate::http::api::UnitApi;
use crate::http::client::HttpClient;
use crate::storage::session::Session;
use crate::sync::syncer::Syncer;
use crate::watch::session::SyncSession;

/// Main application state
pub struct AppState {
    /// Signed-in user, with an absolute units root
    pub session: Arc<Session>,

    /// Remote unit API
    pub api: Arc<dyn UnitApi>,

    /// Watch registry, debounce clock and unit locks
    pub sync_session: Arc<SyncSession>,

    /// Unit syncer
    pub syncer: Arc<Syncer>,

    /// Last unit whose change was confirmed saved
    pub run_candidate: RwLock<Option<String>>,
}

impl AppState {
    /// Initialize application state against the configured server
    pub async fn init(mut session: Session, options: &AppOptions) -> Result<Self, UnitError> {
        info!("Initializing unitsync for {}...", session.login);

        // Watcher events carry absolute paths, so the registry must too
        let root = Dir::new(&session.path);
        root.create().await?;
        session.path = tokio::fs::canonicalize(root.path()).await?;
        debug!("Units root: {}", session.path.display());

        let http_client = HttpClient::new(
            &session.server,
            &session.login,
            &session.key,
            options.http_timeout,
        )?;

        Ok(Self::with_api(session, Arc::new(http_client), options))
    }

    /// Build state around an existing API implementation
    pub fn with_api(session: Session, api: Arc<dyn UnitApi>, options: &AppOptions) -> Self {
        let session = Arc::new(session);
        let sync_session = Arc::new(SyncSession::new(options.debounce));
        let syncer = Arc::new(Syncer::new(api.clone(), session.clone(), sync_session.clone()));
        Self {
            session,
            api,
            sync_session,
            syncer,
            run_candidate: RwLock::new(None),
        }
    }

    pub async fn set_run_candidate(&self, unit: &str) {
        *self.run_candidate.write().await = Some(unit.to_string());
    }

    pub async fn run_candidate(&self) -> Option<String> {
        self.run_candidate.read().await.clone()
    }
}
