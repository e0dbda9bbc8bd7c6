//! Deploy models

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::null_as_default;
use crate::models::unit::{lenient_parameters, Parameter, UnitId};

/// Unit content embedded in a deploy record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeployUnit {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub readme: Option<String>,
}

/// A deploy record as the server sends it.
///
/// `deployed` returns records with an embedded `unit`, the `deploy`
/// endpoint returns them without one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDeploy {
    #[serde(default)]
    pub id: Option<UnitId>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default, deserialize_with = "lenient_parameters")]
    pub parameters: Vec<Parameter>,

    #[serde(default)]
    pub unit: Option<DeployUnit>,
}

/// Canonical deploy shape used everywhere past the HTTP layer
#[derive(Debug, Clone, PartialEq)]
pub struct Deploy {
    pub id: Option<UnitId>,
    /// Name used in run and log URLs
    pub name: String,
    pub code: String,
    pub readme: String,
    pub parameters: Vec<Parameter>,
}

impl RawDeploy {
    /// Normalize into a [`Deploy`], whichever endpoint produced the record.
    ///
    /// Embedded unit content wins over the deploy's own copy; a record without
    /// an embedded unit has an empty readme.
    pub fn normalize(self, unit_name: &str) -> Deploy {
        let unit = self.unit.unwrap_or_default();
        Deploy {
            id: self.id,
            name: self
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| unit_name.to_string()),
            code: unit.code.or(self.code).unwrap_or_default(),
            readme: unit.readme.unwrap_or_default(),
            parameters: self.parameters,
        }
    }
}

/// Response of `GET /api/units/{login}/{name}/deployed`
#[derive(Debug, Clone, Deserialize)]
pub struct DeployedResponse {
    #[serde(default)]
    pub stats: Value,

    #[serde(default, deserialize_with = "null_as_default")]
    pub units: Vec<RawDeploy>,
}

impl DeployedResponse {
    /// The active deploy, if the unit has one
    pub fn active(self, unit_name: &str) -> Option<Deploy> {
        let count = self.stats.as_f64().unwrap_or(0.0);
        if count > 0.0 {
            self.units.into_iter().next().map(|d| d.normalize(unit_name))
        } else {
            None
        }
    }
}

/// Body of `POST /api/units/{login}/{name}/deploy`
#[derive(Debug, Clone, Serialize)]
pub struct CreateDeployRequest {
    pub name: String,
    pub public: bool,
    pub full_name: String,
}
