use crate::model::{AnalysisRequest, AnalysisResult};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Fixed path of the analysis endpoint on the service.
pub const ANALYZE_PATH: &str = "/analyze";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// No usable response: network failure or a body that is not JSON.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered with a non-2xx status.
    #[error("HTTP error! status: {0}")]
    Http(u16),
}

impl AnalysisError {
    pub fn status(&self) -> Option<u16> {
        match self {
            AnalysisError::Http(status) => Some(*status),
            AnalysisError::Transport(_) => None,
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        AnalysisError::Transport(e.to_string())
    }
}

/// Anything that can turn a request into an assessment.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn submit(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError>;
}

/// HTTP client for the remote analysis service.
///
/// No timeout is configured: a request the transport never resolves never
/// completes. There are no retries either; the caller decides what to show.
pub struct AnalysisClient {
    client: Client,
    endpoint: Url,
}

impl AnalysisClient {
    pub fn new(service_url: &str) -> anyhow::Result<Self> {
        let base = Url::parse(service_url)?;
        let endpoint = base.join(ANALYZE_PATH)?;

        let client = Client::builder()
            .user_agent(concat!("cerebro-guard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisBackend for AnalysisClient {
    async fn submit(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        log::debug!("POST {}", self.endpoint);

        let payload = serde_json::to_vec(request)
            .map_err(|e| AnalysisError::Transport(format!("could not encode request: {e}")))?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // The service reports missing fields as {"error": "..."}
            let body = response.text().await.unwrap_or_default();
            match error_detail(&body) {
                Some(detail) => log::warn!("Analysis service returned {}: {}", status, detail),
                None => log::warn!("Analysis service returned {}", status),
            }
            return Err(AnalysisError::Http(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| AnalysisError::Transport(format!("malformed JSON body: {e}")))?;

        Ok(AnalysisResult::from_json_value(&value))
    }
}

fn error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("error")?
        .as_str()
        .map(str::to_string)
}
