//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use unitsync::errors::UnitError;
use unitsync::http::api::UnitApi;
use unitsync::http::client::ByteStream;
use unitsync::models::deploy::Deploy;
use unitsync::models::unit::{
    CreateUnitRequest, Parameter, UnitId, UnitRecord, UnitSummary, UpdateUnitRequest,
};
use unitsync::storage::session::{Session, SessionOverrides};
use unitsync::sync::syncer::Syncer;
use unitsync::watch::session::SyncSession;

/// In-memory `UnitApi` that records every call it receives
#[derive(Default)]
pub struct FakeApi {
    pub available: Vec<UnitSummary>,
    pub records: Vec<UnitRecord>,
    pub deploy: Option<Deploy>,
    pub available_fails: bool,
    pub records_fail: bool,
    pub delete_fails: bool,
    pub create_error: Option<(u16, String)>,
    pub create_deploy_fails: bool,
    pub run_result: Option<Result<String, (u16, String)>>,
    pub log_chunks: Vec<String>,
    pub calls: Mutex<Vec<String>>,
    pub updates: Mutex<Vec<UpdateUnitRequest>>,
}

impl FakeApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<UpdateUnitRequest> {
        self.updates.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl UnitApi for FakeApi {
    async fn available_units(&self) -> Result<Vec<UnitSummary>, UnitError> {
        self.record("available_units");
        if self.available_fails {
            return Err(server_error("units unavailable"));
        }
        Ok(self.available.clone())
    }

    async fn sync_records(&self) -> Result<Vec<UnitRecord>, UnitError> {
        self.record("sync_records");
        if self.records_fail {
            return Err(server_error("sync unavailable"));
        }
        Ok(self.records.clone())
    }

    async fn deployed(&self, unit: &str) -> Result<Option<Deploy>, UnitError> {
        self.record(format!("deployed {}", unit));
        Ok(self.deploy.clone())
    }

    async fn create_unit(&self, request: &CreateUnitRequest) -> Result<UnitRecord, UnitError> {
        self.record(format!("create_unit {}", request.name));
        if let Some((status, body)) = &self.create_error {
            return Err(UnitError::HttpStatus {
                status: *status,
                body: body.clone(),
            });
        }
        Ok(record(7, &request.name, "// new unit", ""))
    }

    async fn create_deploy(&self, unit: &str, public: bool) -> Result<Deploy, UnitError> {
        self.record(format!("create_deploy {} {}", unit, public));
        if self.create_deploy_fails {
            return Err(server_error("deploy failed"));
        }
        Ok(deploy(unit, "", "", vec![]))
    }

    async fn update_unit(&self, unit: &str, request: &UpdateUnitRequest) -> Result<Value, UnitError> {
        self.record(format!("update_unit {}", unit));
        self.updates.lock().unwrap().push(request.clone());
        Ok(json!({
            "code": request.code,
            "readme": request.readme,
            "parameters": request.parameters,
        }))
    }

    async fn delete_unit(&self, unit: &str) -> Result<(), UnitError> {
        self.record(format!("delete_unit {}", unit));
        if self.delete_fails {
            return Err(server_error("delete refused"));
        }
        Ok(())
    }

    async fn run(&self, url: &str) -> Result<String, UnitError> {
        self.record(format!("run {}", url));
        match &self.run_result {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err((status, body))) => Err(UnitError::HttpStatus {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(String::new()),
        }
    }

    async fn log_stream(&self, url: &str) -> Result<ByteStream, UnitError> {
        self.record(format!("log_stream {}", url));
        let chunks: Vec<Result<Vec<u8>, UnitError>> = self
            .log_chunks
            .iter()
            .map(|c| Ok(c.as_bytes().to_vec()))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

fn server_error(body: &str) -> UnitError {
    UnitError::HttpStatus {
        status: 500,
        body: body.to_string(),
    }
}

pub fn summary(id: u64) -> UnitSummary {
    UnitSummary {
        id: UnitId::from(id),
        name: String::new(),
    }
}

pub fn record(id: u64, name: &str, code: &str, readme: &str) -> UnitRecord {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "language": "javascript",
        "code": code,
        "readme": readme,
        "deploys": [{
            "id": id * 10,
            "name": name,
            "parameters": [{"name": "greeting", "type": "public", "value": "hi"}],
        }],
    }))
    .unwrap()
}

pub fn deploy(name: &str, code: &str, readme: &str, parameters: Vec<Parameter>) -> Deploy {
    Deploy {
        id: Some(UnitId::from("d1")),
        name: name.to_string(),
        code: code.to_string(),
        readme: readme.to_string(),
        parameters,
    }
}

pub fn session(root: &Path) -> Session {
    Session::from_overrides(&SessionOverrides {
        dir: Some(root.to_path_buf()),
        login: Some("alice".to_string()),
        key: Some("k3y".to_string()),
        ..Default::default()
    })
}

pub fn syncer(api: Arc<FakeApi>, root: &Path) -> Syncer {
    Syncer::new(
        api,
        Arc::new(session(root)),
        Arc::new(SyncSession::new(Duration::from_secs(3))),
    )
}

/// Create `root/<name>/` with empty unit files
pub fn local_unit(root: &Path, name: &str) {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    for file in ["index.js", "readme.md", "config.json"] {
        std::fs::write(dir.join(file), "").unwrap();
    }
}
