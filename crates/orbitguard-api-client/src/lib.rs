//! Client side of the OrbitGuard analysis service contract.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

mod wire;

pub use wire::{
    ApiKeyReply, AuthReply, CloseApproach, CredentialsRequest, DensityBin, DensityPlan, Endpoint,
    ErrorEnvelope, PredictionReport, RiskReport, SafeBand, SatelliteDetail, SatelliteList,
    SubscriptionTier, TrackedSatellite, UpgradeReply, UserProfile,
};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("server url must not be empty")]
    BaseUrlMissing,
    #[error("invalid request path")]
    InvalidPath,
    #[error("request failed: {message}")]
    Request { message: String },
    #[error("reading response failed: {message}")]
    Read { message: String },
    #[error("response decode failed: {message}")]
    Decode { message: String },
}

/// Raw reply as received, before any classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportReply {
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 401 and 403 are the only statuses that invalidate a credential.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    /// The `error` field of the body, when the body is an error envelope.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        serde_json::from_slice::<ErrorEnvelope>(&self.body)
            .ok()
            .map(|envelope| envelope.error)
            .and_then(|message| non_empty_string(&message))
    }

    pub fn decode<T>(&self) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice::<T>(&self.body).map_err(|error| TransportError::Decode {
            message: error.to_string(),
        })
    }

    #[must_use]
    pub fn body_text(&self) -> String {
        non_empty_string(String::from_utf8_lossy(&self.body).as_ref())
            .unwrap_or_else(|| "<empty>".to_string())
    }
}

/// Seam between the orchestration core and the network.
#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    async fn post(
        &self,
        endpoint: Endpoint,
        body: &serde_json::Value,
    ) -> Result<TransportReply, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub base_url: String,
    /// `None` leaves timing entirely to reqwest.
    pub timeout_ms: Option<u64>,
}

impl HttpTransportConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    timeout: Option<Duration>,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let base_url = normalize_base_url(&config.base_url)?;
        Ok(Self {
            base_url,
            timeout: config.timeout_ms.map(|ms| Duration::from_millis(ms.max(250))),
            http: reqwest::Client::new(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> Option<String> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('/') {
            Some(format!("{}{}", self.base_url, trimmed))
        } else {
            Some(format!("{}/{}", self.base_url, trimmed))
        }
    }
}

#[async_trait]
impl AnalysisTransport for HttpTransport {
    async fn post(
        &self,
        endpoint: Endpoint,
        body: &serde_json::Value,
    ) -> Result<TransportReply, TransportError> {
        let url = self
            .endpoint(endpoint.path())
            .ok_or(TransportError::InvalidPath)?;
        let request_id = format!("req_{}", Uuid::new_v4().simple());
        tracing::debug!(
            path = endpoint.path(),
            authenticated = endpoint.requires_auth(),
            %request_id,
            "posting to analysis service"
        );

        let mut request = self
            .http
            .post(url.as_str())
            .header("x-request-id", request_id.as_str())
            .json(body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|error| {
            tracing::warn!(path = endpoint.path(), error = %error, "analysis request failed");
            TransportError::Request {
                message: error.to_string(),
            }
        })?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|error| TransportError::Read {
                message: error.to_string(),
            })?;

        Ok(TransportReply {
            status,
            body: bytes.to_vec(),
        })
    }
}

fn normalize_base_url(base_url: &str) -> Result<String, TransportError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(TransportError::BaseUrlMissing);
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

fn non_empty_string(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
