//! Unit API client

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::UnitError;
use crate::http::api::UnitApi;
use crate::http::client::{ByteStream, HttpClient};
use crate::models::deploy::{CreateDeployRequest, Deploy, DeployedResponse, RawDeploy};
use crate::models::unit::{
    lenient_records, CreateUnitRequest, UnitList, UnitRecord, UnitSummary, UpdateUnitRequest,
};

impl HttpClient {
    fn unit_path(&self, unit: &str) -> String {
        format!("/api/units/{}/{}", self.login(), unit)
    }
}

#[async_trait]
impl UnitApi for HttpClient {
    async fn available_units(&self) -> Result<Vec<UnitSummary>, UnitError> {
        let list: UnitList = self.get("/api/units").await?;
        Ok(list.items)
    }

    async fn sync_records(&self) -> Result<Vec<UnitRecord>, UnitError> {
        let path = format!("/api/users/{}/sync", self.login());
        let listing: Vec<Value> = self.get(&path).await?;
        Ok(lenient_records(listing))
    }

    async fn deployed(&self, unit: &str) -> Result<Option<Deploy>, UnitError> {
        let path = format!("{}/deployed", self.unit_path(unit));
        let response: DeployedResponse = self.get(&path).await?;
        Ok(response.active(unit))
    }

    async fn create_unit(&self, request: &CreateUnitRequest) -> Result<UnitRecord, UnitError> {
        self.post("/api/units", request).await
    }

    async fn create_deploy(&self, unit: &str, public: bool) -> Result<Deploy, UnitError> {
        let path = format!("{}/deploy", self.unit_path(unit));
        let body = CreateDeployRequest {
            name: unit.to_string(),
            public,
            full_name: format!("{}/{}", self.login(), unit),
        };
        let raw: RawDeploy = self.post(&path, &body).await?;
        Ok(raw.normalize(unit))
    }

    async fn update_unit(&self, unit: &str, request: &UpdateUnitRequest) -> Result<Value, UnitError> {
        self.patch(&self.unit_path(unit), request).await
    }

    async fn delete_unit(&self, unit: &str) -> Result<(), UnitError> {
        self.delete(&self.unit_path(unit)).await
    }

    async fn run(&self, url: &str) -> Result<String, UnitError> {
        self.get_text(url).await
    }

    async fn log_stream(&self, url: &str) -> Result<ByteStream, UnitError> {
        self.get_stream(url).await
    }
}
