//! Environment-independent core of the Moneta advisor chat client.
//!
//! This crate owns the local chat store, the advisor backend client, the
//! risk-profile survey state machine, and the chat engine that ties them
//! together. Front ends (the TUI, tests) drive the engine and render what it
//! returns.

pub mod backend;
pub mod engine;
pub mod store;
pub mod survey;
pub mod types;

pub use backend::{AdvisorBackend, BackendError, HttpAdvisorBackend};
/// Chat engine facade and its outcome types.
pub use engine::{
    ChatEngine, ERROR_REPLY, EngineError, FOLLOW_UP_PROMPT, PRODUCT_CHOICES, SurveyReport,
    TurnOutcome,
};
pub use moneta_config::ChatMode;
pub use store::{ChatStore, JsonlChatStore, StoreError};
pub use survey::{
    Question, QuestionKind, RiskCategory, SurveyError, SurveySession, SurveyStep,
    risk_questionnaire,
};
pub use types::{Message, Role};
