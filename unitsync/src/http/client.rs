//! HTTP client implementation

use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::errors::UnitError;
use crate::utils::user_agent;

/// Chunks of a streaming response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, UnitError>> + Send>>;

/// HTTP client for the unit API
pub struct HttpClient {
    client: Client,
    base_url: String,
    login: String,
    key: String,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client authenticated with `key`
    pub fn new(base_url: &str, login: &str, key: &str, timeout: Duration) -> Result<Self, UnitError> {
        let client = Client::builder().user_agent(user_agent()).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            login: login.to_string(),
            key: key.to_string(),
            timeout,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Login the client acts for
    pub fn login(&self) -> &str {
        &self.login
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(header::AUTHORIZATION, format!("UCKEY {}", self.key))
    }

    async fn check(method: &str, url: &str, response: Response) -> Result<Response, UnitError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP {} {} failed: {} - {}", method, url, status, body);
            return Err(UnitError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, UnitError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let request = self.authorized(self.client.get(&url)).timeout(self.timeout);
        let response = Self::check("GET", &url, request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, UnitError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let request = self
            .authorized(self.client.post(&url))
            .timeout(self.timeout)
            .json(body);
        let response = Self::check("POST", &url, request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Make a PATCH request
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, UnitError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("PATCH {}", url);

        let request = self
            .authorized(self.client.patch(&url))
            .timeout(self.timeout)
            .json(body);
        let response = Self::check("PATCH", &url, request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Make a DELETE request, discarding the body
    pub async fn delete(&self, path: &str) -> Result<(), UnitError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("DELETE {}", url);

        let request = self.authorized(self.client.delete(&url)).timeout(self.timeout);
        Self::check("DELETE", &url, request.send().await?).await?;
        Ok(())
    }

    /// GET an absolute URL and return the body as text
    pub async fn get_text(&self, url: &str) -> Result<String, UnitError> {
        debug!("GET {}", url);

        let request = self.authorized(self.client.get(url)).timeout(self.timeout);
        let response = Self::check("GET", url, request.send().await?).await?;
        Ok(response.text().await?)
    }

    /// GET an absolute URL and stream the body. No timeout applies.
    pub async fn get_stream(&self, url: &str) -> Result<ByteStream, UnitError> {
        debug!("GET {} (stream)", url);

        let response = self.authorized(self.client.get(url)).send().await?;
        let response = Self::check("GET", url, response).await?;
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(UnitError::from));
        Ok(Box::pin(stream))
    }
}

/// Pull a human message out of a server error body.
///
/// Error bodies come as `{"message": ...}`, sometimes wrapped once more as a
/// JSON string.
pub fn unwrap_error_envelope(body: &str) -> Option<String> {
    let mut value: Value = serde_json::from_str(body).ok()?;
    if let Value::String(inner) = &value {
        value = serde_json::from_str(inner).ok()?;
    }
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|m| m.as_str()))
        .map(str::to_string)
}
