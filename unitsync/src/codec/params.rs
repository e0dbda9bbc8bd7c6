//! Conversion between the on-disk `config.json` document and the flat
//! parameter list of the remote API.
//!
//! The document keeps one bucket per parameter scope:
//!
//! ```json
//! { "public": { "name": "value" }, "secret": { "token": "..." } }
//! ```
//!
//! Buckets are keyed maps, so encoding does not keep the list order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::UnitError;
use crate::models::unit::{Parameter, ParameterType};

/// Two-bucket parameter document stored in a unit's config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterDocument {
    pub public: BTreeMap<String, Value>,
    pub secret: BTreeMap<String, Value>,
}

impl ParameterDocument {
    fn bucket_mut(&mut self, kind: ParameterType) -> &mut BTreeMap<String, Value> {
        match kind {
            ParameterType::Public => &mut self.public,
            ParameterType::Secret => &mut self.secret,
        }
    }
}

/// Partition a parameter list into buckets. Unnamed entries are skipped.
pub fn encode(parameters: &[Parameter]) -> ParameterDocument {
    let mut document = ParameterDocument::default();
    for param in parameters.iter().filter(|p| !p.name.is_empty()) {
        document
            .bucket_mut(param.kind)
            .insert(param.name.clone(), param.value.clone());
    }
    document
}

/// Flatten a document back into a list, public entries first.
pub fn decode(document: &ParameterDocument) -> Vec<Parameter> {
    let public = document
        .public
        .iter()
        .map(|(name, value)| Parameter::public(name.clone(), value.clone()));
    let secret = document
        .secret
        .iter()
        .map(|(name, value)| Parameter::secret(name.clone(), value.clone()));
    public.chain(secret).collect()
}

/// Parse and decode the raw contents of a config file.
///
/// `unit` names the owning unit (e.g. `hello/config.json`) in the error.
pub fn decode_str(contents: &str, unit: &str) -> Result<Vec<Parameter>, UnitError> {
    let document: ParameterDocument =
        serde_json::from_str(contents).map_err(|e| UnitError::MalformedConfig {
            unit: unit.to_string(),
            reason: e.to_string(),
        })?;
    Ok(decode(&document))
}

/// Pretty-printed document, as written to disk
pub fn to_pretty_string(parameters: &[Parameter]) -> Result<String, UnitError> {
    Ok(serde_json::to_string_pretty(&encode(parameters))?)
}
