//! Remote unit API seam

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::UnitError;
use crate::http::client::ByteStream;
use crate::models::deploy::Deploy;
use crate::models::unit::{CreateUnitRequest, UnitRecord, UnitSummary, UpdateUnitRequest};

/// Remote operations the sync engine needs, per signed-in user.
///
/// A trait so the engine can be driven by an in-memory fake in tests.
#[async_trait]
pub trait UnitApi: Send + Sync {
    /// Units the user may currently see (`GET /api/units`)
    async fn available_units(&self) -> Result<Vec<UnitSummary>, UnitError>;

    /// Combined unit + deploy listing (`GET /api/users/{login}/sync`)
    async fn sync_records(&self) -> Result<Vec<UnitRecord>, UnitError>;

    /// Active deploy of a unit, if any
    async fn deployed(&self, unit: &str) -> Result<Option<Deploy>, UnitError>;

    async fn create_unit(&self, request: &CreateUnitRequest) -> Result<UnitRecord, UnitError>;

    async fn create_deploy(&self, unit: &str, public: bool) -> Result<Deploy, UnitError>;

    /// Partial update; returns the server's echo of the unit/deploy
    async fn update_unit(&self, unit: &str, request: &UpdateUnitRequest) -> Result<Value, UnitError>;

    async fn delete_unit(&self, unit: &str) -> Result<(), UnitError>;

    /// Trigger execution at a run URL and return the result body
    async fn run(&self, url: &str) -> Result<String, UnitError>;

    /// Open a live log stream at a log URL
    async fn log_stream(&self, url: &str) -> Result<ByteStream, UnitError>;
}
