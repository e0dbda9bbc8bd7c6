//! Trigger a unit run and follow its logs

use std::sync::Arc;

use chrono::Local;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::UnitError;
use crate::http::api::UnitApi;
use crate::run::logs::{LogEvent, LogParser};
use crate::run::urls::{unit_url, UnitEndpoint};
use crate::store::units::find_local_unit;
use crate::sync::syncer::Syncer;

/// Where a failing unit reported its error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPosition {
    Line(u64),
    /// Position descriptor without a line number
    Opaque(String),
}

impl ErrorPosition {
    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        if let Some(line) = value.get("line").and_then(|l| l.as_u64()) {
            return Some(ErrorPosition::Line(line));
        }
        Some(ErrorPosition::Opaque(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }
}

/// Result of triggering a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(String),
    Failed {
        message: String,
        position: Option<ErrorPosition>,
    },
}

#[derive(Debug, Deserialize)]
struct RunErrorBody {
    #[serde(default)]
    error: Value,

    #[serde(default)]
    position: Value,
}

impl RunOutcome {
    /// Structured error payload of a failed run, if the body is one
    fn from_error_body(body: &str) -> Option<Self> {
        let parsed: RunErrorBody = serde_json::from_str(body).ok()?;
        if parsed.error.is_null() {
            return None;
        }
        let message = match parsed.error {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Some(RunOutcome::Failed {
            message,
            position: ErrorPosition::from_value(&parsed.position),
        })
    }
}

/// A triggered run and the task following its log stream
#[derive(Debug)]
pub struct RunReport {
    pub unit: String,
    pub deploy: String,
    pub outcome: RunOutcome,
    /// Ends when the server closes the stream; abort to stop following
    pub logs: Option<JoinHandle<()>>,
}

/// Consume a log stream until it ends, handing each event to `on_event`
fn follow_logs<F>(api: Arc<dyn UnitApi>, url: String, unit: String, mut on_event: F) -> JoinHandle<()>
where
    F: FnMut(LogEvent) + Send + 'static,
{
    tokio::spawn(async move {
        let mut stream = match api.log_stream(&url).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Cannot open log stream of {}: {}", unit, e);
                return;
            }
        };
        let mut parser = LogParser::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => parser.push(&bytes).into_iter().for_each(&mut on_event),
                Err(e) => {
                    warn!("Log stream of {} failed: {}", unit, e);
                    break;
                }
            }
        }
        parser.finish().into_iter().for_each(&mut on_event);
        debug!("End of logs [ {}-{} ]", unit, Local::now().to_rfc3339());
    })
}

/// Run the local unit matching `unit_name` on its deploy and follow the logs.
///
/// `unit_name` may be a glob; the first matching local unit is run.
/// The deploy is created (non-public) if the unit has none.
pub async fn run_unit<F>(
    syncer: &Syncer,
    api: Arc<dyn UnitApi>,
    unit_name: &str,
    on_event: F,
) -> Result<RunReport, UnitError>
where
    F: FnMut(LogEvent) + Send + 'static,
{
    let session = syncer.session();
    let matched = if unit_name.is_empty() {
        None
    } else {
        find_local_unit(&session.path, unit_name).await?
    };
    // The remote side only knows real names, never the pattern
    let Some(resolved) = matched
        .as_deref()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(str::to_string)
    else {
        return Err(UnitError::NoSuchUnit(unit_name.to_string()));
    };
    let unit_name = resolved.as_str();

    let deploy = syncer.resolve_deploy(unit_name).await?;
    info!("Running {} (deploy {})", unit_name, deploy.name);

    let logs_url = unit_url(UnitEndpoint::Logs, session, &deploy.name)?;
    let logs = follow_logs(api.clone(), logs_url, unit_name.to_string(), on_event);

    let run_url = unit_url(UnitEndpoint::Run, session, &deploy.name)?;
    let outcome = match api.run(&run_url).await {
        Ok(body) => RunOutcome::Completed(body),
        Err(UnitError::HttpStatus { status, body }) => match RunOutcome::from_error_body(&body) {
            Some(outcome) => outcome,
            None => {
                logs.abort();
                return Err(UnitError::HttpStatus { status, body });
            }
        },
        Err(e) => {
            logs.abort();
            return Err(e);
        }
    };

    Ok(RunReport {
        unit: unit_name.to_string(),
        deploy: deploy.name,
        outcome,
        logs: Some(logs),
    })
}
