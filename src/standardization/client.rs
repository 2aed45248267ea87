// src/standardization/client.rs - wire types and HTTP access to the standardization proxy

use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::future::Future;

use crate::errors::StandardizationError;
use crate::standardization::config::StandardizationConfig;

/// One logical operation per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    StandardizeName,
    StandardizeAddress,
    CompareNames,
    FindDuplicates,
    ProcessBatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceRequest {
    pub operation: Operation,
    pub data: JsonValue,
}

impl ServiceRequest {
    pub fn new(operation: Operation, data: JsonValue) -> Self {
        Self { operation, data }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub success: bool,
    #[serde(default)]
    pub result: Option<JsonValue>,
    #[serde(default)]
    pub results: Option<JsonValue>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ServiceResponse {
    pub fn ok_result(result: JsonValue) -> Self {
        Self {
            success: true,
            result: Some(result),
            ..Default::default()
        }
    }

    pub fn ok_results(results: JsonValue) -> Self {
        Self {
            success: true,
            results: Some(results),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// `success: false` becomes `ServiceUnavailable` carrying the service's message.
    pub fn into_checked(self) -> Result<Self, StandardizationError> {
        if self.success {
            Ok(self)
        } else {
            Err(StandardizationError::ServiceUnavailable(
                self.error
                    .unwrap_or_else(|| "service reported failure without a message".to_string()),
            ))
        }
    }

    /// Deserializes `result` (single-item operations).
    pub fn parse_result<T: serde::de::DeserializeOwned>(self) -> Result<T, StandardizationError> {
        let value = self.result.ok_or_else(|| {
            StandardizationError::ServiceUnavailable("response is missing 'result'".to_string())
        })?;
        Ok(serde_json::from_value(value)?)
    }

    /// Deserializes `results` (batch operations), accepting `result` as a fallback.
    pub fn parse_results<T: serde::de::DeserializeOwned>(self) -> Result<Vec<T>, StandardizationError> {
        let value = self.results.or(self.result).ok_or_else(|| {
            StandardizationError::ServiceUnavailable("response is missing 'results'".to_string())
        })?;
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: HealthState,
    pub api_configured: bool,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthState::Healthy && self.api_configured
    }
}

/// Result of `standardizeName`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameResult {
    pub original: String,
    pub standardized: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub changes: Vec<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of `standardizeAddress`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResult {
    pub original: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub changes: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of `compareNames`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameComparison {
    pub is_same: bool,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One record's outcome from `processBatch`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardizationResult {
    pub customer_name: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub changes: Vec<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A duplicate group as reported by the service, indices relative to the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDuplicateGroup {
    pub canonical_index: usize,
    pub member_indices: Vec<usize>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// Anything that can answer standardization requests.
pub trait StandardizationService {
    fn call(
        &self,
        request: ServiceRequest,
    ) -> impl Future<Output = Result<ServiceResponse, StandardizationError>> + Send;

    fn health_check(&self) -> impl Future<Output = Result<HealthStatus, StandardizationError>> + Send;
}

/// Talks to the standardization proxy over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStandardizationClient {
    client: Client,
    endpoint: url::Url,
    api_key: String,
}

impl HttpStandardizationClient {
    /// Fails with `Configuration` when the credential is missing or the endpoint is not a URL.
    pub fn new(config: &StandardizationConfig) -> Result<Self, StandardizationError> {
        let api_key = config.require_api_key()?.to_string();
        let endpoint = config.endpoint_url()?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StandardizationError::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

impl StandardizationService for HttpStandardizationClient {
    async fn call(&self, request: ServiceRequest) -> Result<ServiceResponse, StandardizationError> {
        debug!("POST {} operation={:?}", self.endpoint, request.operation);
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StandardizationError::ServiceUnavailable(format!(
                "service returned status {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = response.text().await?;
        let parsed: ServiceResponse = serde_json::from_str(&body)?;
        parsed.into_checked()
    }

    async fn health_check(&self) -> Result<HealthStatus, StandardizationError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StandardizationError::ServiceUnavailable(format!(
                "health check returned status {}",
                response.status()
            )));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
