//! Unit models

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::models::deploy::RawDeploy;
use crate::models::null_as_default;

/// Remote identifier of a unit or deploy.
///
/// The API hands out numeric ids in some payloads and string ids in others,
/// so both are accepted and kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UnitId(pub String);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for UnitId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for UnitId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(UnitId(s)),
            Value::Number(n) => Ok(UnitId(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number id, got {}",
                other
            ))),
        }
    }
}

/// Scope of a parameter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Public,
    /// Write-only: the server never echoes the value back
    Secret,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::Public => "public",
            ParameterType::Secret => "secret",
        }
    }
}

/// A named configuration value of a unit's deploy.
///
/// Serializing a `Parameter` only ever emits `name`, `type` and `value`;
/// any extra fields the server attaches are dropped on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ParameterType,

    #[serde(default)]
    pub value: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterType, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
        }
    }

    pub fn public(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(name, ParameterType::Public, value)
    }

    pub fn secret(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(name, ParameterType::Secret, value)
    }
}

/// Decode a parameter list, dropping `null` entries and entries that are not
/// shaped like a parameter.
pub fn lenient_parameters<'de, D>(deserializer: D) -> Result<Vec<Parameter>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Parameter>(v).ok())
        .collect())
}

/// A unit as materialized locally: code, readme and the parameters of its
/// active deploy.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: Option<UnitId>,
    pub name: String,
    pub language: String,
    pub code: String,
    pub readme: String,
    pub parameters: Vec<Parameter>,
}

/// Entry of `GET /api/units`
#[derive(Debug, Clone, Deserialize)]
pub struct UnitSummary {
    pub id: UnitId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Response of `GET /api/units`
#[derive(Debug, Clone, Deserialize)]
pub struct UnitList {
    #[serde(default)]
    pub items: Vec<UnitSummary>,
}

/// Combined unit + deploy record, as returned by the sync listing and by
/// unit creation.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitRecord {
    #[serde(default)]
    pub id: Option<UnitId>,

    /// Empty when the server sent none; such records are never written
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub language: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub readme: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub deploys: Vec<RawDeploy>,
}

/// Decode the sync listing record by record.
///
/// A record that does not decode is dropped rather than failing the whole
/// listing, since it may well be one the permission filter would discard.
pub fn lenient_records(listing: Vec<Value>) -> Vec<UnitRecord> {
    listing
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<UnitRecord>(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unreadable sync record: {}", e);
                None
            }
        })
        .collect()
}

impl From<UnitRecord> for Unit {
    fn from(record: UnitRecord) -> Self {
        let parameters = record
            .deploys
            .into_iter()
            .next()
            .map(|d| d.parameters)
            .unwrap_or_default();
        Self {
            id: record.id,
            name: record.name,
            language: record.language,
            code: record.code,
            readme: record.readme,
            parameters,
        }
    }
}

/// Body of `POST /api/units`.
///
/// Sent as JSON; the server accepts JSON bodies under the same field names
/// as its form encoding.
#[derive(Debug, Clone, Serialize)]
pub struct CreateUnitRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
}

/// Body of `PATCH /api/units/{login}/{name}`.
///
/// Sent as JSON, like [`CreateUnitRequest`].
#[derive(Debug, Clone, Serialize)]
pub struct UpdateUnitRequest {
    pub code: String,
    pub readme: String,
    pub parameters: Vec<Parameter>,
    pub deployment_id: Option<UnitId>,
    pub full_name: String,
}
