//! Chat engine: submit flow, chat modes, survey reporting, and the
//! post-survey product follow-up.
//!
//! The engine is shared as `Arc` and uses interior mutability so front ends
//! can run turns in spawned tasks while handling fresh input. A conversation
//! epoch fences late completions: `new_chat` bumps it, and a turn that
//! settles under a stale epoch appends nothing.

use crate::backend::{AdvisorBackend, BackendError};
use crate::store::{ChatStore, StoreError};
use crate::survey::RiskCategory;
use crate::types::{Message, Role};
use log::{debug, error, info, warn};
use moneta_config::ChatMode;
use moneta_protocol::{AssistantRequest, PlainChatRequest, RiskProfileReport};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Metadata key under which the backend conversation id is stored.
const THREAD_ID_KEY: &str = "thread_id";

/// Fixed notice appended when a chat turn fails.
pub const ERROR_REPLY: &str = "The advisor could not be reached. Check the logs for details.";

/// Follow-up prompt appended after a successful survey report.
pub const FOLLOW_UP_PROMPT: &str = "Is there an investment product you would like to look into?";

/// Fixed product choices offered by the post-survey follow-up.
pub const PRODUCT_CHOICES: &[&str] = &["Deposit", "Savings plan", "Fund", "Bond", "ETF"];

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Local persistence failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result of a chat submission.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Input was empty or whitespace-only; nothing was sent or stored.
    Rejected,
    /// The backend replied; the reply was appended to the store.
    Replied(Message),
    /// The request failed; a fixed error notice was appended instead.
    Failed(Message),
    /// A new-chat reset happened while the turn was in flight; the late
    /// result was dropped.
    Superseded,
}

/// Messages produced by a successful survey report.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyReport {
    /// Category derived from the survey score.
    pub category: RiskCategory,
    /// Backend acknowledgement of the reported category.
    pub reply: Message,
    /// Follow-up prompt asking for a product of interest.
    pub follow_up: Message,
}

/// Orchestrates the conversation between the local store and the backend.
pub struct ChatEngine {
    store: Arc<dyn ChatStore>,
    backend: Arc<dyn AdvisorBackend>,
    mode: RwLock<ChatMode>,
    pending_choice: Mutex<Option<String>>,
    epoch: AtomicU64,
}

impl ChatEngine {
    /// Create an engine over a store and backend, starting in `mode`.
    pub fn new(store: Arc<dyn ChatStore>, backend: Arc<dyn AdvisorBackend>, mode: ChatMode) -> Self {
        Self {
            store,
            backend,
            mode: RwLock::new(mode),
            pending_choice: Mutex::new(None),
            epoch: AtomicU64::new(0),
        }
    }

    /// Currently selected chat mode.
    pub fn mode(&self) -> ChatMode {
        *self.mode.read()
    }

    /// Select a chat mode.
    pub fn set_mode(&self, mode: ChatMode) {
        info!("switching chat mode (mode={mode})");
        *self.mode.write() = mode;
    }

    /// Flip between assistant and plain mode, returning the new mode.
    pub fn toggle_mode(&self) -> ChatMode {
        let mut mode = self.mode.write();
        *mode = mode.toggled();
        info!("switching chat mode (mode={})", *mode);
        *mode
    }

    /// Current conversation epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// The pending product choice, if one is waiting to be sent.
    pub fn pending_choice(&self) -> Option<String> {
        self.pending_choice.lock().clone()
    }

    /// Full transcript for the initial render.
    pub async fn history(&self) -> Result<Vec<Message>, EngineError> {
        Ok(self.store.list_messages().await?)
    }

    /// Clear all local history and metadata and fence out in-flight turns.
    pub async fn new_chat(&self) -> Result<(), EngineError> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        info!("starting new chat (epoch={epoch})");
        *self.pending_choice.lock() = None;
        self.store.clear_all().await?;
        Ok(())
    }

    /// Run one chat turn: persist the user message, request a reply in the
    /// current mode, and persist what came back.
    ///
    /// Backend and mid-turn store failures become a visible error notice;
    /// only a failure to persist the user message (or the notice itself)
    /// surfaces as `Err`.
    pub async fn submit(&self, input: &str) -> Result<TurnOutcome, EngineError> {
        let message = input.trim();
        if message.is_empty() {
            debug!("rejecting empty submission");
            return Ok(TurnOutcome::Rejected);
        }

        self.store.append_message(Role::User, message).await?;
        let epoch = self.epoch();
        let mode = self.mode();
        info!(
            "submitting chat turn (mode={mode}, content_len={})",
            message.len()
        );

        let reply = match mode {
            ChatMode::Assistant => self.assistant_request(message).await,
            ChatMode::Plain => self.plain_request(message).await,
        };

        match reply {
            Ok(reply) => {
                if self.epoch() != epoch {
                    warn!("dropping stale reply after new chat (epoch={epoch})");
                    return Ok(TurnOutcome::Superseded);
                }
                let stored = self.store.append_message(Role::Assistant, &reply).await?;
                Ok(TurnOutcome::Replied(stored))
            }
            Err(err) => {
                error!("chat turn failed: {err}");
                if self.epoch() != epoch {
                    warn!("dropping stale failure after new chat (epoch={epoch})");
                    return Ok(TurnOutcome::Superseded);
                }
                let notice = self.store.append_message(Role::Assistant, ERROR_REPLY).await?;
                Ok(TurnOutcome::Failed(notice))
            }
        }
    }

    /// One assistant-mode turn. The stored thread id rides along when
    /// present; a returned id is stored only if none exists yet
    /// (first-write-wins, the id is immutable once set).
    async fn assistant_request(&self, message: &str) -> Result<String, TurnError> {
        let thread_id = self.store.get_meta(THREAD_ID_KEY).await?;
        debug!("assistant request (thread_set={})", thread_id.is_some());
        let response = self
            .backend
            .assistant_turn(AssistantRequest {
                message: message.to_string(),
                thread_id,
            })
            .await?;
        if let Some(thread_id) = response.thread_id
            && self.store.get_meta(THREAD_ID_KEY).await?.is_none()
        {
            info!("storing thread id (thread_id={thread_id})");
            self.store.set_meta(THREAD_ID_KEY, &thread_id).await?;
        }
        Ok(response.reply)
    }

    /// One plain-mode turn. The pending choice is consumed here whether or
    /// not the request succeeds (single-use).
    async fn plain_request(&self, message: &str) -> Result<String, TurnError> {
        let choice = self.pending_choice.lock().take();
        debug!("plain request (choice_set={})", choice.is_some());
        let response = self
            .backend
            .plain_turn(PlainChatRequest {
                question: message.to_string(),
                choice,
            })
            .await?;
        Ok(response.reply)
    }

    /// Report the survey category and persist the backend's reply plus the
    /// product follow-up prompt. Report failures are logged only; the chat
    /// stays usable without a recorded profile.
    pub async fn complete_survey(
        &self,
        category: RiskCategory,
    ) -> Result<Option<SurveyReport>, EngineError> {
        info!("reporting risk profile (category={category})");
        let response = match self
            .backend
            .report_risk_profile(RiskProfileReport {
                investment_type: category.as_str().to_string(),
            })
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!("failed to report risk profile: {err}");
                return Ok(None);
            }
        };

        let reply = self
            .store
            .append_message(Role::Assistant, &response.reply)
            .await?;
        let follow_up = self
            .store
            .append_message(Role::Assistant, FOLLOW_UP_PROMPT)
            .await?;
        Ok(Some(SurveyReport {
            category,
            reply,
            follow_up,
        }))
    }

    /// Record a product choice from the follow-up: sets the pending choice
    /// for the next plain-mode request and persists an acknowledgement.
    /// Empty input is ignored.
    pub async fn record_product_choice(
        &self,
        choice: &str,
    ) -> Result<Option<Message>, EngineError> {
        let choice = choice.trim();
        if choice.is_empty() {
            debug!("ignoring empty product choice");
            return Ok(None);
        }
        info!("recording product choice (choice={choice})");
        *self.pending_choice.lock() = Some(choice.to_string());
        let ack = self
            .store
            .append_message(
                Role::Assistant,
                &format!("Would you like to know more about {choice}?"),
            )
            .await?;
        Ok(Some(ack))
    }
}

/// Internal error for a single turn request; both arms become the visible
/// error notice in `submit`.
#[derive(Debug, Error)]
enum TurnError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}
