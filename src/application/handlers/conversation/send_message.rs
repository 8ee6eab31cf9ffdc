//! SendMessage command handler.
//!
//! Handles an inbound visitor message: resolves or starts the conversation,
//! persists the visitor turn and, unless a human agent owns the thread,
//! asks the completion provider for an answer. Long answers are split into
//! several parts; every part after the first is stored as a system message
//! and returned with its reveal delay.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::{AiConfig, ChatConfig};
use crate::domain::conversation::{
    compose_system_prompt, Conversation, NewConversation, OriginInfo, ResponseSplitter,
    RevealPlan, TypingPacing, VisitorProfile,
};
use crate::domain::foundation::{ConversationId, DomainError, MessageId};
use crate::ports::{
    CompletionClient, CompletionError, CompletionRequest, ConversationStore, HistoryEntry,
    VisitorDirectory,
};

/// Command carrying one visitor message.
#[derive(Debug, Clone, Default)]
pub struct SendMessageCommand {
    /// Conversation to continue; a new one is started when absent or unknown.
    pub conversation_id: Option<ConversationId>,
    pub text: String,
    /// Identity of an authenticated visitor, if any.
    pub owner_ref: Option<String>,
    pub session_ref: Option<String>,
    pub origin: OriginInfo,
}

impl SendMessageCommand {
    pub fn new(conversation_id: Option<ConversationId>, text: impl Into<String>) -> Self {
        Self {
            conversation_id,
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_owner_ref(mut self, owner_ref: impl Into<String>) -> Self {
        self.owner_ref = Some(owner_ref.into());
        self
    }

    pub fn with_session_ref(mut self, session_ref: impl Into<String>) -> Self {
        self.session_ref = Some(session_ref.into());
        self
    }

    pub fn with_origin(mut self, origin: OriginInfo) -> Self {
        self.origin = origin;
        self
    }
}

/// How the inbound message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendMessageStatus {
    /// The AI produced an answer.
    Answered,
    /// A human agent owns the conversation; no completion was requested.
    AwaitingHuman,
    /// The completion failed; the visitor turn stays unanswered.
    Errored,
}

/// One continuation part to reveal after the primary response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalResponse {
    pub message_id: MessageId,
    pub content: String,
    /// Wait before revealing this part, measured from the previous reveal.
    pub delay: Duration,
}

/// Outcome of handling one visitor message.
#[derive(Debug, Clone)]
pub struct SendMessageResult {
    pub conversation_id: ConversationId,
    /// The persisted visitor message.
    pub message_id: MessageId,
    pub status: SendMessageStatus,
    pub response: Option<String>,
    pub from_human: bool,
    pub additional_responses: Vec<AdditionalResponse>,
    pub error_message: Option<String>,
}

impl SendMessageResult {
    fn new(conversation_id: ConversationId, message_id: MessageId, status: SendMessageStatus) -> Self {
        Self {
            conversation_id,
            message_id,
            status,
            response: None,
            from_human: false,
            additional_responses: Vec::new(),
            error_message: None,
        }
    }

    /// Additional parts as a reveal schedule.
    ///
    /// For embedders that push parts to the visitor themselves (SSE, a chat
    /// bridge) instead of letting the widget replay `delay_ms`; feed the plan
    /// to [`RevealPlan::play`].
    pub fn reveal_plan(&self, pacing: &TypingPacing) -> RevealPlan {
        RevealPlan::new(
            self.additional_responses.iter().map(|r| r.content.as_str()),
            pacing,
        )
    }
}

/// Errors that can occur when sending a message.
#[derive(Debug, Clone, Error)]
pub enum SendMessageError {
    /// Visitor messaging is switched off.
    #[error("Chat is currently disabled")]
    ChatDisabled,

    /// Message text is empty or whitespace only.
    #[error("Validation error: message cannot be empty")]
    EmptyMessage,

    /// Persistence failed.
    #[error(transparent)]
    Store(#[from] DomainError),
}

/// Immutable settings the handler is built with.
#[derive(Debug, Clone)]
pub struct SendMessageSettings {
    pub enabled: bool,
    pub system_prompt: String,
    /// Shown when the failure carries no visitor-facing message.
    pub error_message: String,
    pub splitter: ResponseSplitter,
    pub pacing: TypingPacing,
}

impl SendMessageSettings {
    pub fn from_config(chat: &ChatConfig, ai: &AiConfig) -> Self {
        Self {
            enabled: chat.enabled,
            system_prompt: ai.system_prompt.clone(),
            error_message: chat.error_message.clone(),
            splitter: chat.splitter(),
            pacing: chat.pacing(),
        }
    }
}

impl Default for SendMessageSettings {
    fn default() -> Self {
        Self::from_config(&ChatConfig::default(), &AiConfig::default())
    }
}

/// Handler for SendMessage commands.
pub struct SendMessageHandler {
    store: Arc<dyn ConversationStore>,
    completion: Arc<dyn CompletionClient>,
    directory: Option<Arc<dyn VisitorDirectory>>,
    settings: SendMessageSettings,
}

impl SendMessageHandler {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        completion: Arc<dyn CompletionClient>,
        settings: SendMessageSettings,
    ) -> Self {
        Self {
            store,
            completion,
            directory: None,
            settings,
        }
    }

    /// Enables prompt personalization for identified visitors.
    pub fn with_visitor_directory(mut self, directory: Arc<dyn VisitorDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub async fn handle(&self, cmd: SendMessageCommand) -> Result<SendMessageResult, SendMessageError> {
        if !self.settings.enabled {
            return Err(SendMessageError::ChatDisabled);
        }

        let text = cmd.text.trim();
        if text.is_empty() {
            return Err(SendMessageError::EmptyMessage);
        }

        // 1. Resolve or start the conversation
        let conversation = self.resolve_conversation(&cmd).await?;
        let conversation_id = conversation.id();

        // 2. Persist the visitor turn
        let message = self.store.append_message(&conversation_id, text).await?;
        tracing::debug!(
            conversation_id = %conversation_id,
            message_id = %message.id,
            "Visitor message stored"
        );

        // 3. Human-owned threads never get an AI answer
        if conversation.is_human_owned() {
            tracing::info!(
                conversation_id = %conversation_id,
                status = "awaiting_human",
                "Message queued for human agent"
            );
            return Ok(SendMessageResult::new(
                conversation_id,
                message.id,
                SendMessageStatus::AwaitingHuman,
            ));
        }

        // 4. Ask the completion provider
        let history: Vec<HistoryEntry> = self
            .store
            .messages(&conversation_id)
            .await?
            .iter()
            .filter(|m| m.id != message.id)
            .map(HistoryEntry::from)
            .collect();

        let profile = self.visitor_profile(conversation.owner_ref()).await;
        let system_prompt = compose_system_prompt(&self.settings.system_prompt, profile.as_ref());
        let request = CompletionRequest::new(system_prompt, history, text);

        let completion = match self.completion.complete(request).await {
            Ok(completion) => completion,
            Err(error) => {
                log_completion_failure(&conversation_id, &error);
                let mut result =
                    SendMessageResult::new(conversation_id, message.id, SendMessageStatus::Errored);
                result.error_message = Some(
                    error
                        .visitor_message()
                        .unwrap_or(self.settings.error_message.as_str())
                        .to_string(),
                );
                return Ok(result);
            }
        };

        // 5. Split and persist every part
        let mut parts = self.settings.splitter.split(&completion).into_iter();
        let primary = parts.next().unwrap_or_default();
        self.store
            .append_response(&message.id, &primary, false)
            .await?;

        let plan = RevealPlan::new(parts, &self.settings.pacing);
        let mut additional_responses = Vec::with_capacity(plan.steps().len());
        for step in plan.steps() {
            let stored = self
                .store
                .append_system_message(&conversation_id, &step.content)
                .await?;
            additional_responses.push(AdditionalResponse {
                message_id: stored.id,
                content: step.content.clone(),
                delay: step.delay,
            });
        }

        tracing::info!(
            conversation_id = %conversation_id,
            message_id = %message.id,
            status = "answered",
            parts = additional_responses.len() + 1,
            "AI response stored"
        );

        let mut result =
            SendMessageResult::new(conversation_id, message.id, SendMessageStatus::Answered);
        result.response = Some(primary);
        result.additional_responses = additional_responses;
        Ok(result)
    }

    async fn resolve_conversation(
        &self,
        cmd: &SendMessageCommand,
    ) -> Result<Conversation, DomainError> {
        if let Some(id) = cmd.conversation_id {
            match self.store.find_conversation(&id).await? {
                Some(conversation) if conversation.is_active() => return Ok(conversation),
                Some(_) => {
                    tracing::debug!(conversation_id = %id, "Conversation closed, starting a new one")
                }
                None => tracing::debug!(conversation_id = %id, "Unknown conversation, starting a new one"),
            }
        }

        let conversation = self
            .store
            .create_conversation(NewConversation {
                owner_ref: cmd.owner_ref.clone(),
                session_ref: cmd.session_ref.clone(),
                origin: cmd.origin.clone(),
            })
            .await?;
        tracing::info!(conversation_id = %conversation.id(), "Conversation started");
        Ok(conversation)
    }

    async fn visitor_profile(&self, owner_ref: Option<&str>) -> Option<VisitorProfile> {
        let (directory, owner_ref) = match (&self.directory, owner_ref) {
            (Some(directory), Some(owner_ref)) => (directory, owner_ref),
            _ => return None,
        };

        match directory.profile(owner_ref).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(owner_ref, error = %e, "Visitor profile lookup failed");
                None
            }
        }
    }
}

fn log_completion_failure(conversation_id: &ConversationId, error: &CompletionError) {
    match error {
        CompletionError::MissingCredential => tracing::error!(
            conversation_id = %conversation_id,
            status = "errored",
            "Completion provider credential is not configured"
        ),
        CompletionError::Upstream { kind, message } => tracing::warn!(
            conversation_id = %conversation_id,
            status = "errored",
            kind = %kind,
            message = %message,
            "Completion provider returned an unusable response"
        ),
        CompletionError::Transport { message, timed_out } => tracing::warn!(
            conversation_id = %conversation_id,
            status = "errored",
            timed_out = *timed_out,
            message = %message,
            "Completion request failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::ScriptedCompletionClient;
    use crate::adapters::storage::{InMemoryConversationStore, InMemoryVisitorDirectory};
    use crate::domain::conversation::ResponseOwner;
    use crate::ports::UpstreamErrorKind;

    struct Fixture {
        store: Arc<InMemoryConversationStore>,
        client: ScriptedCompletionClient,
        handler: SendMessageHandler,
    }

    fn fixture(client: ScriptedCompletionClient) -> Fixture {
        fixture_with(client, SendMessageSettings::default())
    }

    fn fixture_with(client: ScriptedCompletionClient, settings: SendMessageSettings) -> Fixture {
        let store = Arc::new(InMemoryConversationStore::new());
        let handler = SendMessageHandler::new(store.clone(), Arc::new(client.clone()), settings);
        Fixture {
            store,
            client,
            handler,
        }
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    mod routing {
        use super::*;

        #[tokio::test]
        async fn hello_from_new_visitor_is_answered_in_one_part() {
            let f = fixture(
                ScriptedCompletionClient::new()
                    .with_reply("Hi there! What can I help you with today, friend?"),
            );

            let result = f.handler.handle(SendMessageCommand::new(None, "Hello")).await.unwrap();

            assert_eq!(result.status, SendMessageStatus::Answered);
            assert_eq!(
                result.response.as_deref(),
                Some("Hi there! What can I help you with today, friend?")
            );
            assert!(!result.from_human);
            assert!(result.additional_responses.is_empty());
            assert_eq!(f.store.conversation_count().await, 1);

            let transcript = f.store.messages(&result.conversation_id).await.unwrap();
            assert_eq!(transcript.len(), 1);
            assert_eq!(transcript[0].text.as_deref(), Some("Hello"));
            assert!(transcript[0].response_text.is_some());
        }

        #[tokio::test]
        async fn human_owned_conversation_skips_completion() {
            let f = fixture(ScriptedCompletionClient::new().with_default_reply("never"));
            let first = f
                .handler
                .handle(SendMessageCommand::new(None, "Hello"))
                .await
                .unwrap();
            f.store
                .set_response_owner(&first.conversation_id, ResponseOwner::Human)
                .await
                .unwrap();
            let calls_before = f.client.call_count();

            let result = f
                .handler
                .handle(SendMessageCommand::new(Some(first.conversation_id), "Anyone there?"))
                .await
                .unwrap();

            assert_eq!(result.status, SendMessageStatus::AwaitingHuman);
            assert_eq!(result.response, None);
            assert_eq!(f.client.call_count(), calls_before);

            let last = f.store.last_message(&first.conversation_id).await.unwrap().unwrap();
            assert_eq!(last.text.as_deref(), Some("Anyone there?"));
            assert!(last.response_text.is_none());
        }

        #[tokio::test]
        async fn unknown_conversation_id_starts_new_conversation() {
            let f = fixture(ScriptedCompletionClient::new().with_default_reply("ok"));
            let unknown = ConversationId::new();

            let result = f
                .handler
                .handle(SendMessageCommand::new(Some(unknown), "Hello"))
                .await
                .unwrap();

            assert_ne!(result.conversation_id, unknown);
            assert_eq!(f.store.conversation_count().await, 1);
        }

        #[tokio::test]
        async fn closed_conversation_is_not_reopened() {
            let f = fixture(ScriptedCompletionClient::new().with_default_reply("ok"));
            let first = f.handler.handle(SendMessageCommand::new(None, "Hi")).await.unwrap();
            f.store.close_conversation(&first.conversation_id).await.unwrap();

            let second = f
                .handler
                .handle(SendMessageCommand::new(Some(first.conversation_id), "Back again"))
                .await
                .unwrap();

            assert_ne!(second.conversation_id, first.conversation_id);
            assert_eq!(f.store.messages(&first.conversation_id).await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn provenance_is_recorded_on_new_conversation() {
            let f = fixture(ScriptedCompletionClient::new().with_default_reply("ok"));
            let cmd = SendMessageCommand::new(None, "Hi")
                .with_owner_ref("42")
                .with_session_ref("sess-1")
                .with_origin(OriginInfo::new("203.0.113.9", Some("Firefox".to_string())));

            let result = f.handler.handle(cmd).await.unwrap();

            let conversation = f
                .store
                .find_conversation(&result.conversation_id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(conversation.owner_ref(), Some("42"));
            assert_eq!(conversation.session_ref(), Some("sess-1"));
            assert_eq!(conversation.origin().client_address, "203.0.113.9");
        }
    }

    mod validation {
        use super::*;

        #[tokio::test]
        async fn disabled_chat_rejects_messages() {
            let settings = SendMessageSettings {
                enabled: false,
                ..SendMessageSettings::default()
            };
            let f = fixture_with(ScriptedCompletionClient::new(), settings);

            let result = f.handler.handle(SendMessageCommand::new(None, "Hello")).await;

            assert!(matches!(result, Err(SendMessageError::ChatDisabled)));
            assert_eq!(f.store.conversation_count().await, 0);
        }

        #[tokio::test]
        async fn blank_message_is_rejected() {
            let f = fixture(ScriptedCompletionClient::new());
            let result = f.handler.handle(SendMessageCommand::new(None, "   \n")).await;
            assert!(matches!(result, Err(SendMessageError::EmptyMessage)));
        }

        #[tokio::test]
        async fn message_text_is_trimmed() {
            let f = fixture(ScriptedCompletionClient::new().with_default_reply("ok"));
            let result = f
                .handler
                .handle(SendMessageCommand::new(None, "  Where is my order?  "))
                .await
                .unwrap();

            let request = f.client.last_request().unwrap();
            assert_eq!(request.new_message, "Where is my order?");
            let stored = f.store.last_message(&result.conversation_id).await.unwrap().unwrap();
            assert_eq!(stored.text.as_deref(), Some("Where is my order?"));
        }
    }

    mod splitting {
        use super::*;

        #[tokio::test]
        async fn two_paragraph_reply_yields_one_additional_part() {
            let reply = format!("{}.\n\n{}.", words(30), words(30));
            let f = fixture(ScriptedCompletionClient::new().with_reply(reply));

            let result = f.handler.handle(SendMessageCommand::new(None, "Tell me")).await.unwrap();

            assert_eq!(result.status, SendMessageStatus::Answered);
            assert_eq!(result.response, Some(format!("{}.", words(30))));
            assert_eq!(result.additional_responses.len(), 1);
            assert_eq!(result.additional_responses[0].content, format!("{}.", words(30)));

            let transcript = f.store.messages(&result.conversation_id).await.unwrap();
            assert_eq!(transcript.len(), 2);
            assert!(!transcript[0].is_system_message);
            assert!(transcript[1].is_system_message);
            assert_eq!(transcript[1].text, None);
            assert_eq!(transcript[1].id, result.additional_responses[0].message_id);
        }

        #[tokio::test]
        async fn additional_parts_keep_order_and_carry_delays() {
            let f = fixture(ScriptedCompletionClient::new().with_reply("One.\n\nTwo two.\n\nThree three three."));
            let pacing = SendMessageSettings::default().pacing;

            let result = f.handler.handle(SendMessageCommand::new(None, "Go")).await.unwrap();

            let contents: Vec<&str> = result
                .additional_responses
                .iter()
                .map(|r| r.content.as_str())
                .collect();
            assert_eq!(contents, vec!["Two two.", "Three three three."]);
            for part in &result.additional_responses {
                assert_eq!(part.delay, pacing.delay_for(&part.content));
            }
            let plan = result.reveal_plan(&pacing);
            assert_eq!(plan.steps().len(), 2);
            assert_eq!(plan.steps()[0].content, "Two two.");
        }

        #[tokio::test]
        async fn reveal_plan_plays_parts_in_order() {
            let f = fixture(ScriptedCompletionClient::new().with_reply("One.\n\nTwo.\n\nThree."));
            let result = f.handler.handle(SendMessageCommand::new(None, "Go")).await.unwrap();

            let instant = TypingPacing::new(Duration::ZERO, Duration::ZERO, Duration::ZERO);
            let (tx, mut rx) = tokio::sync::mpsc::channel(4);
            let delivered = result.reveal_plan(&instant).play(tx).await;

            assert_eq!(delivered, 2);
            assert_eq!(rx.recv().await.as_deref(), Some("Two."));
            assert_eq!(rx.recv().await.as_deref(), Some("Three."));
            assert_eq!(rx.recv().await, None);
        }
    }

    mod history {
        use super::*;

        #[tokio::test]
        async fn history_excludes_the_new_message() {
            let f = fixture(
                ScriptedCompletionClient::new()
                    .with_reply("First answer")
                    .with_reply("Second answer"),
            );
            let first = f.handler.handle(SendMessageCommand::new(None, "First")).await.unwrap();

            f.handler
                .handle(SendMessageCommand::new(Some(first.conversation_id), "Second"))
                .await
                .unwrap();

            let request = f.client.last_request().unwrap();
            assert_eq!(request.new_message, "Second");
            assert_eq!(
                request.history,
                vec![HistoryEntry::new("First", Some("First answer".to_string()))]
            );
        }

        #[tokio::test]
        async fn known_visitor_profile_extends_system_prompt() {
            let store = Arc::new(InMemoryConversationStore::new());
            let client = ScriptedCompletionClient::new().with_default_reply("ok");
            let directory = InMemoryVisitorDirectory::new();
            directory
                .insert(
                    "7",
                    VisitorProfile {
                        display_name: "Nadia".to_string(),
                        recent_orders: vec![],
                    },
                )
                .await;
            let handler = SendMessageHandler::new(
                store,
                Arc::new(client.clone()),
                SendMessageSettings::default(),
            )
            .with_visitor_directory(Arc::new(directory));

            handler
                .handle(SendMessageCommand::new(None, "Hi").with_owner_ref("7"))
                .await
                .unwrap();

            let prompt = client.last_request().unwrap().system_prompt;
            assert!(prompt.contains("Nadia"));
            assert!(prompt.contains("No order history available."));
        }
    }

    mod failures {
        use super::*;

        #[tokio::test]
        async fn upstream_message_is_passed_to_visitor() {
            let f = fixture(ScriptedCompletionClient::new().with_error(CompletionError::upstream(
                UpstreamErrorKind::RateLimited,
                "Rate limit reached",
            )));

            let result = f.handler.handle(SendMessageCommand::new(None, "Hello")).await.unwrap();

            assert_eq!(result.status, SendMessageStatus::Errored);
            assert_eq!(result.error_message.as_deref(), Some("Rate limit reached"));
            let stored = f.store.last_message(&result.conversation_id).await.unwrap().unwrap();
            assert!(stored.response_text.is_none());
        }

        #[tokio::test]
        async fn missing_credential_shows_generic_apology() {
            let f = fixture(ScriptedCompletionClient::new().with_error(CompletionError::MissingCredential));

            let result = f.handler.handle(SendMessageCommand::new(None, "Hello")).await.unwrap();

            assert_eq!(result.status, SendMessageStatus::Errored);
            assert_eq!(
                result.error_message.as_deref(),
                Some(SendMessageSettings::default().error_message.as_str())
            );
        }

        #[tokio::test]
        async fn transport_failure_is_not_retried() {
            let f = fixture(
                ScriptedCompletionClient::new()
                    .with_error(CompletionError::transport("timed out", true))
                    .with_default_reply("late"),
            );

            let result = f.handler.handle(SendMessageCommand::new(None, "Hello")).await.unwrap();

            assert_eq!(result.status, SendMessageStatus::Errored);
            assert_eq!(f.client.call_count(), 1);
        }
    }
}
