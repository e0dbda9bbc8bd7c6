//! Unit synchronization between the server and the local units root

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::errors::UnitError;
use crate::filesys::dir::Dir;
use crate::http::api::UnitApi;
use crate::http::client::unwrap_error_envelope;
use crate::models::deploy::Deploy;
use crate::models::unit::{CreateUnitRequest, Unit, UnitId, UpdateUnitRequest};
use crate::storage::layout::UnitLayout;
use crate::storage::session::Session;
use crate::store::units::{delete_local_unit, find_local_unit, materialize};
use crate::watch::classifier::ChangedContent;
use crate::watch::session::SyncSession;

/// Sync state
#[derive(Debug, Clone)]
pub struct SyncState {
    pub last_attempted_sync_at: DateTime<Utc>,
    pub last_synced_at: DateTime<Utc>,
    pub synced_units: usize,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            last_attempted_sync_at: DateTime::<Utc>::MIN_UTC,
            last_synced_at: DateTime::<Utc>::MIN_UTC,
            synced_units: 0,
        }
    }
}

/// A unit name that is safe to use as a directory under the units root
fn is_safe_unit_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Unit syncer
pub struct Syncer {
    api: Arc<dyn UnitApi>,
    session: Arc<Session>,
    sync_session: Arc<SyncSession>,
    state: RwLock<SyncState>,
}

impl Syncer {
    /// Create a new syncer. Units are mirrored under `session.path`.
    pub fn new(api: Arc<dyn UnitApi>, session: Arc<Session>, sync_session: Arc<SyncSession>) -> Self {
        Self {
            api,
            session,
            sync_session,
            state: RwLock::new(SyncState::default()),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn sync_session(&self) -> &SyncSession {
        &self.sync_session
    }

    /// Get sync state
    pub async fn get_state(&self) -> SyncState {
        self.state.read().await.clone()
    }

    /// Mirror every unit the user may see to the local root.
    ///
    /// Only units listed by both the permission listing and the sync listing
    /// are written. Returns the number of units written.
    pub async fn sync_units(&self) -> Result<usize, UnitError> {
        {
            let mut state = self.state.write().await;
            state.last_attempted_sync_at = Utc::now();
        }
        info!("Starting unit sync...");

        let root = Dir::new(&self.session.path);
        root.create().await?;

        let (available, records) =
            tokio::join!(self.api.available_units(), self.api.sync_records());
        let permitted: HashSet<UnitId> = available
            .map_err(|e| UnitError::GetUnits(e.to_string()))?
            .into_iter()
            .map(|u| u.id)
            .collect();
        let records = records.map_err(|e| UnitError::SaveUnits(e.to_string()))?;
        debug!("Permitted units: {}, sync records: {}", permitted.len(), records.len());

        let units: Vec<Unit> = records
            .into_iter()
            .filter(|r| r.id.as_ref().is_some_and(|id| permitted.contains(id)))
            .map(Unit::from)
            .collect();

        let mut written = 0;
        let mut failures = Vec::new();
        for unit in &units {
            if !is_safe_unit_name(&unit.name) {
                warn!("Skipping unit with unusable name {:?}", unit.name);
                continue;
            }
            match materialize(unit, root.path(), self.sync_session.registry()).await {
                Ok(path) => {
                    debug!("Saved {} to {}", unit.name, path.display());
                    written += 1;
                }
                Err(e) => {
                    warn!("Failed to save unit {}: {}", unit.name, e);
                    failures.push(format!("{}: {}", unit.name, e));
                }
            }
        }
        if !failures.is_empty() {
            return Err(UnitError::SaveUnits(failures.join("; ")));
        }

        let mut state = self.state.write().await;
        state.last_synced_at = Utc::now();
        state.synced_units = written;
        info!("Synced {} units to {}", written, root.path().display());
        Ok(written)
    }

    /// Create a unit on the server and materialize it locally.
    ///
    /// Returns the local unit directory.
    pub async fn create_new_unit(
        &self,
        name: &str,
        description: &str,
        is_public: bool,
    ) -> Result<PathBuf, UnitError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(UnitError::NoUnitName);
        }
        if !is_safe_unit_name(name) {
            return Err(UnitError::CreateUnit(format!("invalid unit name {:?}", name)));
        }

        let request = CreateUnitRequest {
            name: name.to_string(),
            description: description.to_string(),
            public: is_public,
        };
        let record = match self.api.create_unit(&request).await {
            Ok(record) => record,
            Err(UnitError::HttpStatus { status, body }) => {
                return Err(match unwrap_error_envelope(&body) {
                    Some(message) => UnitError::Remote(message),
                    None => UnitError::CreateUnit(format!("{}: HTTP {} {}", name, status, body)),
                });
            }
            Err(e) => return Err(UnitError::CreateUnit(format!("{}: {}", name, e))),
        };

        let mut unit = Unit::from(record);
        if unit.name.is_empty() {
            unit.name = name.to_string();
        }
        let path = materialize(&unit, &self.session.path, self.sync_session.registry())
            .await
            .map_err(|e| UnitError::CreateUnit(format!("{}: {}", unit.name, e)))?;
        info!("Unit {} created at {}", unit.name, path.display());
        Ok(path)
    }

    /// Active deploy of `unit`, creating a non-public one when there is none
    pub async fn resolve_deploy(&self, unit: &str) -> Result<Deploy, UnitError> {
        if let Some(deploy) = self.api.deployed(unit).await? {
            return Ok(deploy);
        }
        info!("No deploy for {}, creating one", unit);
        self.api
            .create_deploy(unit, false)
            .await
            .map_err(|e| UnitError::NoDeploy {
                unit: unit.to_string(),
                reason: e.to_string(),
            })
    }

    /// Push one changed part of a unit.
    ///
    /// Fields that did not change are filled from the active deploy.
    /// Returns the server's echo for drift checking.
    pub async fn update_unit(&self, unit: &str, changed: &ChangedContent) -> Result<Value, UnitError> {
        let deploy = self.resolve_deploy(unit).await.map_err(|e| match e {
            e @ UnitError::NoDeploy { .. } => e,
            e => UnitError::UpdateUnit(format!("{}: {}", unit, e)),
        })?;
        debug!("Updating {} ({:?}) on deploy {:?}", unit, changed.kind(), deploy.id);

        let Deploy {
            id,
            code,
            readme,
            parameters,
            ..
        } = deploy;
        let mut request = UpdateUnitRequest {
            code,
            readme,
            parameters,
            deployment_id: id,
            full_name: self.session.full_name(unit),
        };
        match changed {
            ChangedContent::Code(code) => request.code = code.clone(),
            ChangedContent::Readme(readme) => request.readme = readme.clone(),
            ChangedContent::Parameters(params) => request.parameters = params.clone(),
        }

        self.api
            .update_unit(unit, &request)
            .await
            .map_err(|e| UnitError::UpdateUnit(format!("{}: {}", unit, e)))
    }

    /// Delete units matching `names` remotely, then locally.
    ///
    /// Remote and local failures are logged and do not stop the other
    /// deletions. Returns the names of the units found.
    pub async fn delete_units(&self, names: &[String]) -> Result<String, UnitError> {
        let mut found: Vec<PathBuf> = Vec::new();
        for name in names {
            match find_local_unit(&self.session.path, name).await? {
                Some(path) if !found.contains(&path) => found.push(path),
                Some(_) => {}
                None => warn!("No local unit matches {:?}", name),
            }
        }
        if found.is_empty() {
            return Err(UnitError::NoUnitsFound);
        }

        let units: Vec<String> = found
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();

        for unit in &units {
            if let Err(e) = self.api.delete_unit(unit).await {
                warn!("Error while deleting unit \"{}\" from server: {}", unit, e);
            }
        }

        for (path, unit) in found.iter().zip(&units) {
            if let Err(e) = delete_local_unit(path).await {
                warn!("{}", e);
                continue;
            }
            for file in UnitLayout::new(&self.session.path, unit).paths() {
                self.sync_session.registry().deregister(&file);
            }
            info!("Deleted unit {}", unit);
        }

        Ok(units.join(" "))
    }
}
