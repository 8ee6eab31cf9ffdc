//! HTTP DTOs for the visitor widget endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{AdditionalResponse, SendMessageResult, SendMessageStatus};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Visitor message sent from the widget.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Unparseable or unknown ids start a new conversation.
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub session_ref: Option<String>,
    /// Identity of a signed-in visitor, supplied by the embedding page.
    #[serde(default)]
    pub owner_ref: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsQuery {
    #[serde(default)]
    pub owner_ref: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalResponseDto {
    pub message_id: i64,
    pub content: String,
    /// Milliseconds to wait after the previous reveal.
    pub delay_ms: u64,
}

impl From<AdditionalResponse> for AdditionalResponseDto {
    fn from(part: AdditionalResponse) -> Self {
        Self {
            message_id: part.message_id.as_i64(),
            content: part.content,
            delay_ms: u64::try_from(part.delay.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub conversation_id: String,
    pub message_id: i64,
    pub status: SendMessageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub from_human: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_responses: Vec<AdditionalResponseDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<SendMessageResult> for SendMessageResponse {
    fn from(result: SendMessageResult) -> Self {
        Self {
            conversation_id: result.conversation_id.to_string(),
            message_id: result.message_id.as_i64(),
            status: result.status,
            response: result.response,
            from_human: result.from_human,
            additional_responses: result
                .additional_responses
                .into_iter()
                .map(Into::into)
                .collect(),
            error_message: result.error_message,
        }
    }
}
