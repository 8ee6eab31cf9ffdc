//! HTTP adapters - REST API for the widget and the admin console.
//!
//! Each area has its own DTOs, handlers and routes:
//! - `chat` - visitor widget (`/api/chat`)
//! - `admin` - admin console (`/api/admin`, bearer token required)

pub mod admin;
pub mod chat;
pub mod error;
pub mod middleware;

use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Json, Router};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::application::handlers::{
    ChangeOwnerHandler, CloseConversationHandler, GetConversationHandler, GetStatisticsHandler,
    GetWidgetSettingsHandler, HumanResponseHandler, ListActiveHandler, NeedingAttentionHandler,
    SearchConversationsHandler, SendMessageHandler, SendMessageSettings,
};
use crate::config::{AppConfig, ServerConfig};
use crate::ports::{CompletionClient, ConversationStore, VisitorDirectory};

pub use admin::{admin_routes, AdminHandlers};
pub use chat::{chat_routes, ChatHandlers};
pub use error::ErrorResponse;
pub use middleware::AdminAuthState;

/// Everything the router needs, wired from configuration and adapters.
#[derive(Clone)]
pub struct ApiState {
    pub chat: ChatHandlers,
    pub admin: AdminHandlers,
    pub admin_auth: AdminAuthState,
}

impl ApiState {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn ConversationStore>,
        completion: Arc<dyn CompletionClient>,
        directory: Option<Arc<dyn VisitorDirectory>>,
    ) -> Self {
        let mut send_message = SendMessageHandler::new(
            store.clone(),
            completion,
            SendMessageSettings::from_config(&config.chat, &config.ai),
        );
        let mut settings = GetWidgetSettingsHandler::new(config.chat.clone());
        if let Some(directory) = directory {
            send_message = send_message.with_visitor_directory(directory.clone());
            settings = settings.with_visitor_directory(directory);
        }

        let chat = ChatHandlers::new(Arc::new(send_message), Arc::new(settings));
        let admin = AdminHandlers {
            list_active: Arc::new(ListActiveHandler::new(store.clone())),
            get_conversation: Arc::new(GetConversationHandler::new(store.clone())),
            change_owner: Arc::new(ChangeOwnerHandler::new(
                store.clone(),
                config.chat.human_takeover_enabled,
            )),
            human_response: Arc::new(HumanResponseHandler::new(store.clone())),
            close_conversation: Arc::new(CloseConversationHandler::new(store.clone())),
            needing_attention: Arc::new(NeedingAttentionHandler::new(store.clone())),
            search: Arc::new(SearchConversationsHandler::new(store.clone())),
            statistics: Arc::new(GetStatisticsHandler::new(store)),
        };

        Self {
            chat,
            admin,
            admin_auth: Arc::new(config.admin.api_token.clone()),
        }
    }
}

/// Builds the full application router with tracing, CORS and timeout layers.
pub fn build_router(state: ApiState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/chat", chat_routes(state.chat))
        .nest("/api/admin", admin_routes(state.admin, state.admin_auth))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(server))
        .layer(TimeoutLayer::new(server.request_timeout()))
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Any origin unless `server.cors_origins` lists specific ones.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
