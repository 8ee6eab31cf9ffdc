//! HTTP handlers for the admin console endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::{domain_error_response, invalid_id_response, ErrorResponse};
use crate::application::handlers::{
    ChangeOwnerCommand, ChangeOwnerHandler, CloseConversationCommand, CloseConversationHandler,
    GetConversationHandler, GetConversationQuery, GetStatisticsHandler, HumanResponseCommand,
    HumanResponseError, HumanResponseHandler, ListActiveHandler, ListActiveQuery,
    NeedingAttentionHandler, NeedingAttentionQuery, OwnershipError, PageRequest,
    SearchConversationsHandler, SearchConversationsQuery,
};
use crate::domain::foundation::ConversationId;

use super::dto::{
    CloseResponse, ConversationDetailResponse, ConversationSummaryResponse, HumanResponseRequest,
    MessageResponse, OwnershipResponse, PageParams, PageResponse, SearchParams, StatsResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct AdminHandlers {
    pub list_active: Arc<ListActiveHandler>,
    pub get_conversation: Arc<GetConversationHandler>,
    pub change_owner: Arc<ChangeOwnerHandler>,
    pub human_response: Arc<HumanResponseHandler>,
    pub close_conversation: Arc<CloseConversationHandler>,
    pub needing_attention: Arc<NeedingAttentionHandler>,
    pub search: Arc<SearchConversationsHandler>,
    pub statistics: Arc<GetStatisticsHandler>,
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/admin/conversations - Active conversations, most recent first
pub async fn list_active(
    State(handlers): State<AdminHandlers>,
    Query(params): Query<PageParams>,
) -> Response {
    let query = ListActiveQuery {
        page: params.to_request(),
    };
    match handlers.list_active.handle(query).await {
        Ok(page) => {
            let response: PageResponse<ConversationSummaryResponse> = page.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => domain_error_response(e),
    }
}

/// GET /api/admin/conversations/attention - Human-owned or unanswered
pub async fn needing_attention(
    State(handlers): State<AdminHandlers>,
    Query(params): Query<PageParams>,
) -> Response {
    let query = NeedingAttentionQuery {
        page: params.to_request(),
    };
    match handlers.needing_attention.handle(query).await {
        Ok(page) => {
            let response: PageResponse<ConversationSummaryResponse> = page.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => domain_error_response(e),
    }
}

/// GET /api/admin/conversations/search?q= - Search active conversations
pub async fn search(
    State(handlers): State<AdminHandlers>,
    Query(params): Query<SearchParams>,
) -> Response {
    let query = SearchConversationsQuery {
        term: params.q,
        page: PageRequest::new(params.page, params.limit),
    };
    match handlers.search.handle(query).await {
        Ok(page) => {
            let response: PageResponse<ConversationSummaryResponse> = page.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => domain_error_response(e),
    }
}

/// GET /api/admin/conversations/:id - Conversation with full transcript
pub async fn get_conversation(
    State(handlers): State<AdminHandlers>,
    Path(raw_id): Path<String>,
) -> Response {
    let Ok(conversation_id) = raw_id.parse::<ConversationId>() else {
        return invalid_id_response(&raw_id);
    };

    match handlers
        .get_conversation
        .handle(GetConversationQuery { conversation_id })
        .await
    {
        Ok(detail) => {
            (StatusCode::OK, Json(ConversationDetailResponse::from(detail))).into_response()
        }
        Err(e) => domain_error_response(e),
    }
}

/// POST /api/admin/conversations/:id/takeover - Hand the thread to a human
pub async fn takeover(
    State(handlers): State<AdminHandlers>,
    Path(raw_id): Path<String>,
) -> Response {
    let Ok(conversation_id) = raw_id.parse::<ConversationId>() else {
        return invalid_id_response(&raw_id);
    };
    change_owner(&handlers, ChangeOwnerCommand::takeover(conversation_id)).await
}

/// POST /api/admin/conversations/:id/return - Hand the thread back to the AI
pub async fn return_to_ai(
    State(handlers): State<AdminHandlers>,
    Path(raw_id): Path<String>,
) -> Response {
    let Ok(conversation_id) = raw_id.parse::<ConversationId>() else {
        return invalid_id_response(&raw_id);
    };
    change_owner(&handlers, ChangeOwnerCommand::return_to_ai(conversation_id)).await
}

/// POST /api/admin/conversations/:id/respond - Agent reply
pub async fn respond(
    State(handlers): State<AdminHandlers>,
    Path(raw_id): Path<String>,
    Json(req): Json<HumanResponseRequest>,
) -> Response {
    let Ok(conversation_id) = raw_id.parse::<ConversationId>() else {
        return invalid_id_response(&raw_id);
    };

    match handlers
        .human_response
        .handle(HumanResponseCommand::new(conversation_id, req.message))
        .await
    {
        Ok(message) => (StatusCode::OK, Json(MessageResponse::from(message))).into_response(),
        Err(HumanResponseError::EmptyResponse) => ErrorResponse::bad_request("Message cannot be empty")
            .into_response_with(StatusCode::BAD_REQUEST),
        Err(HumanResponseError::Domain(e)) => domain_error_response(e),
    }
}

/// POST /api/admin/conversations/:id/close - Close a conversation
pub async fn close(
    State(handlers): State<AdminHandlers>,
    Path(raw_id): Path<String>,
) -> Response {
    let Ok(conversation_id) = raw_id.parse::<ConversationId>() else {
        return invalid_id_response(&raw_id);
    };

    match handlers
        .close_conversation
        .handle(CloseConversationCommand { conversation_id })
        .await
    {
        Ok(result) => (StatusCode::OK, Json(CloseResponse::from(result))).into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// GET /api/admin/stats - Dashboard statistics
pub async fn stats(State(handlers): State<AdminHandlers>) -> Response {
    match handlers.statistics.handle().await {
        Ok(stats) => (StatusCode::OK, Json(StatsResponse::from(stats))).into_response(),
        Err(e) => domain_error_response(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════════════

async fn change_owner(handlers: &AdminHandlers, cmd: ChangeOwnerCommand) -> Response {
    match handlers.change_owner.handle(cmd).await {
        Ok(result) => (StatusCode::OK, Json(OwnershipResponse::from(result))).into_response(),
        Err(e) => handle_ownership_error(e),
    }
}

fn handle_ownership_error(error: OwnershipError) -> Response {
    match error {
        OwnershipError::TakeoverDisabled => ErrorResponse::forbidden("Human takeover is disabled")
            .into_response_with(StatusCode::FORBIDDEN),
        OwnershipError::Domain(e) => domain_error_response(e),
    }
}
