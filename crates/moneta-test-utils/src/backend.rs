use async_trait::async_trait;
use moneta_core::backend::{AdvisorBackend, BackendError};
use moneta_protocol::{
    AssistantReply, AssistantRequest, PlainChatReply, PlainChatRequest, RiskProfileReply,
    RiskProfileReport,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Backend that answers every call with a fixed reply.
#[derive(Debug, Clone)]
pub struct FixedBackend {
    reply: String,
    thread_id: Option<String>,
}

impl FixedBackend {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            thread_id: None,
        }
    }

    /// Attach a thread id to every assistant reply.
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}

#[async_trait]
impl AdvisorBackend for FixedBackend {
    async fn assistant_turn(
        &self,
        _request: AssistantRequest,
    ) -> Result<AssistantReply, BackendError> {
        Ok(AssistantReply {
            reply: self.reply.clone(),
            thread_id: self.thread_id.clone(),
        })
    }

    async fn plain_turn(&self, _request: PlainChatRequest) -> Result<PlainChatReply, BackendError> {
        Ok(PlainChatReply {
            reply: self.reply.clone(),
        })
    }

    async fn report_risk_profile(
        &self,
        _report: RiskProfileReport,
    ) -> Result<RiskProfileReply, BackendError> {
        Ok(RiskProfileReply {
            reply: self.reply.clone(),
        })
    }
}

/// Backend that records every request it receives.
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    reply: String,
    thread_id: Option<String>,
    pub assistant_requests: Arc<Mutex<Vec<AssistantRequest>>>,
    pub plain_requests: Arc<Mutex<Vec<PlainChatRequest>>>,
    pub reports: Arc<Mutex<Vec<RiskProfileReport>>>,
}

impl RecordingBackend {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            thread_id: None,
            assistant_requests: Arc::new(Mutex::new(Vec::new())),
            plain_requests: Arc::new(Mutex::new(Vec::new())),
            reports: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Attach a thread id to every assistant reply.
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}

#[async_trait]
impl AdvisorBackend for RecordingBackend {
    async fn assistant_turn(
        &self,
        request: AssistantRequest,
    ) -> Result<AssistantReply, BackendError> {
        self.assistant_requests.lock().push(request);
        Ok(AssistantReply {
            reply: self.reply.clone(),
            thread_id: self.thread_id.clone(),
        })
    }

    async fn plain_turn(&self, request: PlainChatRequest) -> Result<PlainChatReply, BackendError> {
        self.plain_requests.lock().push(request);
        Ok(PlainChatReply {
            reply: self.reply.clone(),
        })
    }

    async fn report_risk_profile(
        &self,
        report: RiskProfileReport,
    ) -> Result<RiskProfileReply, BackendError> {
        self.reports.lock().push(report);
        Ok(RiskProfileReply {
            reply: self.reply.clone(),
        })
    }
}

/// Backend that fails every call with an HTTP status error.
#[derive(Debug, Clone)]
pub struct FailingBackend {
    status: u16,
}

impl FailingBackend {
    pub fn new() -> Self {
        Self { status: 500 }
    }

    pub fn with_status(status: u16) -> Self {
        Self { status }
    }
}

impl Default for FailingBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdvisorBackend for FailingBackend {
    async fn assistant_turn(
        &self,
        _request: AssistantRequest,
    ) -> Result<AssistantReply, BackendError> {
        Err(BackendError::Status(self.status))
    }

    async fn plain_turn(&self, _request: PlainChatRequest) -> Result<PlainChatReply, BackendError> {
        Err(BackendError::Status(self.status))
    }

    async fn report_risk_profile(
        &self,
        _report: RiskProfileReport,
    ) -> Result<RiskProfileReply, BackendError> {
        Err(BackendError::Status(self.status))
    }
}

/// Backend that holds each chat turn open until released, for interleaving
/// tests (e.g. a new-chat reset racing an in-flight reply).
pub struct GatedBackend {
    reply: String,
    gate: Semaphore,
    entered: Semaphore,
}

impl GatedBackend {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            gate: Semaphore::new(0),
            entered: Semaphore::new(0),
        }
    }

    /// Wait until a chat turn has reached the backend.
    pub async fn wait_entered(&self) {
        self.entered.acquire().await.expect("gate closed").forget();
    }

    /// Let one held chat turn finish.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    async fn hold(&self) {
        self.entered.add_permits(1);
        self.gate.acquire().await.expect("gate closed").forget();
    }
}

#[async_trait]
impl AdvisorBackend for GatedBackend {
    async fn assistant_turn(
        &self,
        _request: AssistantRequest,
    ) -> Result<AssistantReply, BackendError> {
        self.hold().await;
        Ok(AssistantReply {
            reply: self.reply.clone(),
            thread_id: None,
        })
    }

    async fn plain_turn(&self, _request: PlainChatRequest) -> Result<PlainChatReply, BackendError> {
        self.hold().await;
        Ok(PlainChatReply {
            reply: self.reply.clone(),
        })
    }

    async fn report_risk_profile(
        &self,
        _report: RiskProfileReport,
    ) -> Result<RiskProfileReply, BackendError> {
        self.hold().await;
        Ok(RiskProfileReply {
            reply: self.reply.clone(),
        })
    }
}
