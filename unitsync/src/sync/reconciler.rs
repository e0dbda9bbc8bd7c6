//! Detect save failures by comparing what was sent with the server's echo

use serde_json::Value;

use crate::models::unit::{lenient_parameters, Parameter, ParameterType};
use crate::watch::classifier::{ChangedContent, ContentKind};

/// Outcome of comparing a pushed change with the server's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveCheck {
    Saved,
    NotSaved {
        kind: ContentKind,
        /// Every mismatch is a secret parameter. Secrets are never echoed,
        /// so this is expected and not an error.
        secret_only: bool,
    },
}

impl SaveCheck {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveCheck::Saved)
    }
}

/// Parameters echoed by the server: the deploy's own list when the response
/// carries one, else the top-level list.
fn echoed_parameters(response: &Value) -> Vec<Parameter> {
    let candidates = [
        response.get("deployment").and_then(|d| d.get("parameters")),
        response
            .get("deploys")
            .and_then(|d| d.get(0))
            .and_then(|d| d.get("parameters")),
        response.get("parameters"),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter(|v| !v.is_null())
        .find_map(|v| lenient_parameters(v.clone()).ok())
        .unwrap_or_default()
}

fn same_parameter(a: &Parameter, b: &Parameter) -> bool {
    a.name == b.name && a.kind == b.kind && a.value == b.value
}

/// Set-equality on `(name, type, value)`. Returns `None` on match, else
/// whether every unmatched entry is a secret.
fn compare_parameters(sent: &[Parameter], echoed: &[Parameter]) -> Option<bool> {
    let missing: Vec<&Parameter> = sent
        .iter()
        .filter(|p| !echoed.iter().any(|e| same_parameter(p, e)))
        .collect();
    let extra: Vec<&Parameter> = echoed
        .iter()
        .filter(|e| !sent.iter().any(|p| same_parameter(p, e)))
        .collect();
    if missing.is_empty() && extra.is_empty() {
        return None;
    }
    let secret_only = missing
        .iter()
        .chain(extra.iter())
        .all(|p| p.kind == ParameterType::Secret);
    Some(secret_only)
}

/// Check whether `sent` made it to the server, given the update response
pub fn check_saved(sent: &ChangedContent, response: &Value) -> SaveCheck {
    let kind = sent.kind();
    match sent {
        ChangedContent::Parameters(params) => {
            match compare_parameters(params, &echoed_parameters(response)) {
                None => SaveCheck::Saved,
                Some(secret_only) => SaveCheck::NotSaved { kind, secret_only },
            }
        }
        ChangedContent::Code(value) | ChangedContent::Readme(value) => {
            let echoed = response.get(kind.as_str()).and_then(|v| v.as_str());
            if echoed == Some(value.as_str()) {
                SaveCheck::Saved
            } else {
                SaveCheck::NotSaved {
                    kind,
                    secret_only: false,
                }
            }
        }
    }
}
