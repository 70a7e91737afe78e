//! Wire types for the advisor backend endpoints.
//!
//! Three JSON-over-HTTP endpoints are consumed: `POST /assistant` for the
//! threaded chat mode, `POST /chat` for the stateless mode, and
//! `POST /investment-type` for reporting the survey result. All bodies are
//! plain JSON objects; optional fields are omitted rather than sent null.

use serde::{Deserialize, Serialize};

/// Request body for `POST /assistant`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssistantRequest {
    /// User message for this turn.
    pub message: String,
    /// Server-side conversation id, present once one has been assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Response body for `POST /assistant`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssistantReply {
    /// Assistant reply text.
    pub reply: String,
    /// Conversation id assigned by the backend, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Request body for `POST /chat` (stateless mode).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlainChatRequest {
    /// User message for this turn.
    pub question: String,
    /// One-shot product choice set by the survey follow-up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<String>,
}

/// Response body for `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlainChatReply {
    /// Assistant reply text.
    pub reply: String,
}

/// Request body for `POST /investment-type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskProfileReport {
    /// Category label derived from the survey score.
    #[serde(rename = "investmentType")]
    pub investment_type: String,
}

/// Response body for `POST /investment-type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskProfileReply {
    /// Acknowledgement text presented to the user.
    pub reply: String,
}

#[cfg(test)]
mod tests {
    use super::{AssistantRequest, PlainChatRequest, RiskProfileReport};
    use pretty_assertions::assert_eq;

    #[test]
    fn assistant_request_omits_missing_thread_id() {
        let body = serde_json::to_value(AssistantRequest {
            message: "hello".to_string(),
            thread_id: None,
        })
        .expect("serialize");
        assert_eq!(body, serde_json::json!({"message": "hello"}));

        let body = serde_json::to_value(AssistantRequest {
            message: "hello".to_string(),
            thread_id: Some("t-1".to_string()),
        })
        .expect("serialize");
        assert_eq!(
            body,
            serde_json::json!({"message": "hello", "thread_id": "t-1"})
        );
    }

    #[test]
    fn plain_request_omits_missing_choice() {
        let body = serde_json::to_value(PlainChatRequest {
            question: "what is an ETF?".to_string(),
            choice: None,
        })
        .expect("serialize");
        assert_eq!(body, serde_json::json!({"question": "what is an ETF?"}));
    }

    #[test]
    fn report_uses_camel_case_field() {
        let body = serde_json::to_value(RiskProfileReport {
            investment_type: "stable".to_string(),
        })
        .expect("serialize");
        assert_eq!(body, serde_json::json!({"investmentType": "stable"}));
    }
}
