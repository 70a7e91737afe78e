//! Remote advisor endpoints and their HTTP client.

use async_trait::async_trait;
use log::debug;
use moneta_protocol::{
    AssistantReply, AssistantRequest, PlainChatReply, PlainChatRequest, RiskProfileReply,
    RiskProfileReport,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors returned by advisor backend calls.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure (connect, timeout, malformed body).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend answered with a non-success HTTP status.
    #[error("backend returned status {0}")]
    Status(u16),
}

/// Client abstraction over the three advisor endpoints.
#[async_trait]
pub trait AdvisorBackend: Send + Sync {
    /// `POST /assistant`: one turn of the threaded chat mode.
    async fn assistant_turn(
        &self,
        request: AssistantRequest,
    ) -> Result<AssistantReply, BackendError>;
    /// `POST /chat`: one turn of the stateless chat mode.
    async fn plain_turn(&self, request: PlainChatRequest) -> Result<PlainChatReply, BackendError>;
    /// `POST /investment-type`: report the survey category.
    async fn report_risk_profile(
        &self,
        report: RiskProfileReport,
    ) -> Result<RiskProfileReply, BackendError>;
}

/// reqwest-backed advisor client.
pub struct HttpAdvisorBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAdvisorBackend {
    /// Create a client for the given base URL (trailing slashes are trimmed).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{path}", self.base_url);
        debug!("posting to advisor (url={url})");
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AdvisorBackend for HttpAdvisorBackend {
    async fn assistant_turn(
        &self,
        request: AssistantRequest,
    ) -> Result<AssistantReply, BackendError> {
        self.post_json("assistant", &request).await
    }

    async fn plain_turn(&self, request: PlainChatRequest) -> Result<PlainChatReply, BackendError> {
        self.post_json("chat", &request).await
    }

    async fn report_risk_profile(
        &self,
        report: RiskProfileReport,
    ) -> Result<RiskProfileReply, BackendError> {
        self.post_json("investment-type", &report).await
    }
}
