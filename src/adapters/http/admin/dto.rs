//! HTTP DTOs for the admin console endpoints.
//!
//! These types decouple the HTTP API from domain types.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{
    ChangeOwnerResult, CloseConversationResult, ConversationDetail, Page, PageRequest,
};
use crate::domain::conversation::{Conversation, Message, ResponseOwner};
use crate::ports::{AttentionItem, ConversationStats, ConversationSummary, DailyCount};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// `?page&limit` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn to_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// `?q&page&limit` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Agent reply body.
#[derive(Debug, Clone, Deserialize)]
pub struct HumanResponseRequest {
    pub message: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    pub is_from_human: bool,
    pub is_response_from_human: bool,
    pub is_system_message: bool,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_at: Option<String>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id.as_i64(),
            text: message.text,
            response_text: message.response_text,
            is_from_human: message.is_from_human,
            is_response_from_human: message.is_response_from_human,
            is_system_message: message.is_system_message,
            created_at: message.created_at.to_rfc3339(),
            response_at: message.response_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_ref: Option<String>,
    pub client_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_agent: Option<String>,
    pub is_active: bool,
    pub is_human_takeover: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Conversation> for ConversationResponse {
    fn from(c: &Conversation) -> Self {
        Self {
            id: c.id().to_string(),
            owner_ref: c.owner_ref().map(String::from),
            session_ref: c.session_ref().map(String::from),
            client_address: c.origin().client_address.clone(),
            client_agent: c.origin().client_agent.clone(),
            is_active: c.is_active(),
            is_human_takeover: c.is_human_owned(),
            created_at: c.created_at().to_rfc3339(),
            updated_at: c.updated_at().to_rfc3339(),
        }
    }
}

/// Listing row: the conversation plus its latest message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummaryResponse {
    #[serde(flatten)]
    pub conversation: ConversationResponse,
    pub last_message: Option<MessageResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unanswered_count: Option<u64>,
}

impl From<ConversationSummary> for ConversationSummaryResponse {
    fn from(summary: ConversationSummary) -> Self {
        Self {
            conversation: ConversationResponse::from(&summary.conversation),
            last_message: summary.last_message.map(Into::into),
            unanswered_count: None,
        }
    }
}

impl From<AttentionItem> for ConversationSummaryResponse {
    fn from(item: AttentionItem) -> Self {
        let mut response = Self::from(item.summary);
        response.unanswered_count = Some(item.unanswered_count);
        response
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl<S, T: From<S>> From<Page<S>> for PageResponse<T> {
    fn from(page: Page<S>) -> Self {
        Self {
            items: page.items.into_iter().map(T::from).collect(),
            page: page.page,
            limit: page.limit,
            total: page.total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationDetailResponse {
    pub conversation: ConversationResponse,
    pub messages: Vec<MessageResponse>,
}

impl From<ConversationDetail> for ConversationDetailResponse {
    fn from(detail: ConversationDetail) -> Self {
        Self {
            conversation: ConversationResponse::from(&detail.conversation),
            messages: detail.messages.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipResponse {
    pub conversation_id: String,
    pub owner: ResponseOwner,
    pub is_human_takeover: bool,
    pub changed: bool,
}

impl From<ChangeOwnerResult> for OwnershipResponse {
    fn from(result: ChangeOwnerResult) -> Self {
        Self {
            conversation_id: result.conversation_id.to_string(),
            owner: result.owner,
            is_human_takeover: result.owner.is_human(),
            changed: result.changed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseResponse {
    pub conversation_id: String,
    pub is_active: bool,
    pub closed_now: bool,
}

impl From<CloseConversationResult> for CloseResponse {
    fn from(result: CloseConversationResult) -> Self {
        Self {
            conversation_id: result.conversation_id.to_string(),
            is_active: false,
            closed_now: result.closed_now,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCountResponse {
    pub date: String,
    pub count: u64,
}

impl From<DailyCount> for DailyCountResponse {
    fn from(day: DailyCount) -> Self {
        Self {
            date: day.date.format("%Y-%m-%d").to_string(),
            count: day.count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_conversations: u64,
    pub active_conversations: u64,
    pub human_takeover_conversations: u64,
    pub total_messages: u64,
    pub daily_new_conversations: Vec<DailyCountResponse>,
}

impl From<ConversationStats> for StatsResponse {
    fn from(stats: ConversationStats) -> Self {
        Self {
            total_conversations: stats.total_conversations,
            active_conversations: stats.active_conversations,
            human_takeover_conversations: stats.human_owned_conversations,
            total_messages: stats.total_messages,
            daily_new_conversations: stats
                .daily_new_conversations
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}
