//! Integration tests for the conversation lifecycle.
//!
//! These tests drive the application handlers against the in-memory store
//! and the scripted completion client:
//! 1. Visitor messages are answered, split and persisted
//! 2. Human takeover suppresses completion calls
//! 3. Closing removes a conversation from the active list only
//! 4. History sent to the provider is bounded

use std::sync::Arc;

use support_chat::adapters::{
    InMemoryConversationStore, InMemoryVisitorDirectory, ScriptedCompletionClient,
};
use support_chat::application::handlers::{
    ChangeOwnerCommand, ChangeOwnerHandler, CloseConversationCommand, CloseConversationHandler,
    GetConversationHandler, GetConversationQuery, HumanResponseCommand, HumanResponseHandler,
    ListActiveHandler, ListActiveQuery, SendMessageCommand, SendMessageHandler,
    SendMessageSettings, SendMessageStatus,
};
use support_chat::domain::conversation::{ResponseOwner, VisitorProfile};
use support_chat::ports::{CompletionError, ConversationStore};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    store: Arc<InMemoryConversationStore>,
    client: ScriptedCompletionClient,
    send: SendMessageHandler,
    owner: ChangeOwnerHandler,
    respond: HumanResponseHandler,
    close: CloseConversationHandler,
    list: ListActiveHandler,
    get: GetConversationHandler,
}

impl Harness {
    fn new() -> Self {
        Self::with_client(ScriptedCompletionClient::new().with_default_reply("Happy to help."))
    }

    fn with_client(client: ScriptedCompletionClient) -> Self {
        let store = Arc::new(InMemoryConversationStore::new());
        let send = SendMessageHandler::new(
            store.clone(),
            Arc::new(client.clone()),
            SendMessageSettings::default(),
        );
        Self {
            owner: ChangeOwnerHandler::new(store.clone(), true),
            respond: HumanResponseHandler::new(store.clone()),
            close: CloseConversationHandler::new(store.clone()),
            list: ListActiveHandler::new(store.clone()),
            get: GetConversationHandler::new(store.clone()),
            store,
            client,
            send,
        }
    }
}

/// `count` words ending in a full stop, no paragraph breaks.
fn sentence(count: usize) -> String {
    let words: Vec<&str> = std::iter::repeat("word").take(count).collect();
    format!("{}.", words.join(" "))
}

// =============================================================================
// Answering
// =============================================================================

#[tokio::test]
async fn first_message_starts_conversation_and_is_answered() {
    let h = Harness::with_client(ScriptedCompletionClient::new().with_reply("Hi! How can I help?"));

    let result = h
        .send
        .handle(SendMessageCommand::new(None, "Hello"))
        .await
        .unwrap();

    assert_eq!(result.status, SendMessageStatus::Answered);
    assert_eq!(result.response.as_deref(), Some("Hi! How can I help?"));
    assert!(!result.from_human);
    assert!(result.additional_responses.is_empty());

    let messages = h.store.messages(&result.conversation_id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text.as_deref(), Some("Hello"));
    assert_eq!(messages[0].response_text.as_deref(), Some("Hi! How can I help?"));
    assert!(!messages[0].is_response_from_human);

    let request = h.client.last_request().unwrap();
    assert!(request.history.is_empty());
    assert_eq!(request.new_message, "Hello");
}

#[tokio::test]
async fn two_paragraph_answer_becomes_two_parts() {
    let reply = format!("{}\n\n{}", sentence(30), sentence(30));
    let h = Harness::with_client(ScriptedCompletionClient::new().with_reply(reply));

    let result = h
        .send
        .handle(SendMessageCommand::new(None, "Tell me everything"))
        .await
        .unwrap();

    assert_eq!(result.response.as_deref(), Some(sentence(30).as_str()));
    assert_eq!(result.additional_responses.len(), 1);
    assert_eq!(result.additional_responses[0].content, sentence(30));
    assert!(!result.additional_responses[0].delay.is_zero());

    let messages = h.store.messages(&result.conversation_id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert!(!messages[0].is_system_message);
    assert!(messages[1].is_system_message);
    assert!(messages[1].text.is_none());
    assert_eq!(messages[1].response_text.as_deref(), Some(sentence(30).as_str()));
}

#[tokio::test]
async fn follow_up_reuses_conversation_and_sends_history() {
    let h = Harness::new();

    let first = h
        .send
        .handle(SendMessageCommand::new(None, "Where is my order?"))
        .await
        .unwrap();
    let second = h
        .send
        .handle(SendMessageCommand::new(Some(first.conversation_id), "Thanks"))
        .await
        .unwrap();

    assert_eq!(first.conversation_id, second.conversation_id);

    let request = h.client.last_request().unwrap();
    assert_eq!(request.history.len(), 1);
    assert_eq!(request.history[0].text.as_deref(), Some("Where is my order?"));
    assert_eq!(request.new_message, "Thanks");
}

#[tokio::test]
async fn provider_sees_at_most_ten_exchanges() {
    let h = Harness::new();

    let mut conversation_id = None;
    for i in 0..15 {
        let result = h
            .send
            .handle(SendMessageCommand::new(conversation_id, format!("question {i}")))
            .await
            .unwrap();
        conversation_id = Some(result.conversation_id);
    }

    let request = h.client.last_request().unwrap();
    assert_eq!(request.history.len(), 14);

    let kept = request.recent_history(10);
    assert_eq!(kept.len(), 10);
    assert_eq!(kept[0].text.as_deref(), Some("question 4"));

    // system + 10 user/assistant pairs + new user turn
    assert_eq!(request.to_chat_messages(10).len(), 22);
}

#[tokio::test]
async fn known_visitor_gets_personalized_prompt() {
    let client = ScriptedCompletionClient::new().with_default_reply("Sure.");
    let store = Arc::new(InMemoryConversationStore::new());
    let directory = Arc::new(InMemoryVisitorDirectory::new());
    directory
        .insert(
            "customer-42",
            VisitorProfile {
                display_name: "Amina".to_string(),
                recent_orders: vec![],
            },
        )
        .await;
    let send = SendMessageHandler::new(
        store,
        Arc::new(client.clone()),
        SendMessageSettings::default(),
    )
    .with_visitor_directory(directory);

    send.handle(SendMessageCommand::new(None, "Hi").with_owner_ref("customer-42"))
        .await
        .unwrap();

    let prompt = client.last_request().unwrap().system_prompt;
    assert!(prompt.contains("The visitor's name is Amina."));
    assert!(prompt.contains("No order history available."));
}

#[tokio::test]
async fn provider_failure_leaves_turn_unanswered() {
    let h = Harness::with_client(
        ScriptedCompletionClient::new().with_error(CompletionError::MissingCredential),
    );

    let result = h
        .send
        .handle(SendMessageCommand::new(None, "Hello"))
        .await
        .unwrap();

    assert_eq!(result.status, SendMessageStatus::Errored);
    assert!(result.response.is_none());
    assert_eq!(
        result.error_message.as_deref(),
        Some(SendMessageSettings::default().error_message.as_str())
    );

    let messages = h.store.messages(&result.conversation_id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].response_text.is_none());
}

// =============================================================================
// Human takeover
// =============================================================================

#[tokio::test]
async fn human_owned_conversation_never_calls_provider() {
    let h = Harness::new();
    let first = h
        .send
        .handle(SendMessageCommand::new(None, "Hello"))
        .await
        .unwrap();
    let calls_before = h.client.call_count();

    h.owner
        .handle(ChangeOwnerCommand::takeover(first.conversation_id))
        .await
        .unwrap();

    let result = h
        .send
        .handle(SendMessageCommand::new(Some(first.conversation_id), "Is anyone there?"))
        .await
        .unwrap();

    assert_eq!(result.status, SendMessageStatus::AwaitingHuman);
    assert!(result.response.is_none());
    assert_eq!(h.client.call_count(), calls_before);

    let reply = h
        .respond
        .handle(HumanResponseCommand::new(first.conversation_id, "Yes, Sam here."))
        .await
        .unwrap();
    assert_eq!(reply.id, result.message_id);
    assert_eq!(reply.response_text.as_deref(), Some("Yes, Sam here."));
    assert!(reply.is_response_from_human);
}

#[tokio::test]
async fn ownership_changes_are_idempotent() {
    let h = Harness::new();
    let started = h
        .send
        .handle(SendMessageCommand::new(None, "Hello"))
        .await
        .unwrap();
    let id = started.conversation_id;

    let first = h.owner.handle(ChangeOwnerCommand::takeover(id)).await.unwrap();
    let again = h.owner.handle(ChangeOwnerCommand::takeover(id)).await.unwrap();
    assert!(first.changed);
    assert!(!again.changed);
    assert_eq!(again.owner, ResponseOwner::Human);

    let back = h.owner.handle(ChangeOwnerCommand::return_to_ai(id)).await.unwrap();
    let back_again = h.owner.handle(ChangeOwnerCommand::return_to_ai(id)).await.unwrap();
    assert!(back.changed);
    assert!(!back_again.changed);

    let conversation = h.store.find_conversation(&id).await.unwrap().unwrap();
    assert!(!conversation.is_human_owned());

    let result = h
        .send
        .handle(SendMessageCommand::new(Some(id), "Back to the bot"))
        .await
        .unwrap();
    assert_eq!(result.status, SendMessageStatus::Answered);
}

// =============================================================================
// Closing
// =============================================================================

#[tokio::test]
async fn closed_conversation_leaves_active_list_but_stays_readable() {
    let h = Harness::new();
    let started = h
        .send
        .handle(SendMessageCommand::new(None, "Hello"))
        .await
        .unwrap();
    let id = started.conversation_id;

    let page = h.list.handle(ListActiveQuery::default()).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total, Some(1));

    let closed = h
        .close
        .handle(CloseConversationCommand { conversation_id: id })
        .await
        .unwrap();
    assert!(closed.closed_now);

    let page = h.list.handle(ListActiveQuery::default()).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, Some(0));

    let detail = h
        .get
        .handle(GetConversationQuery { conversation_id: id })
        .await
        .unwrap();
    assert!(!detail.conversation.is_active());
    assert_eq!(detail.messages.len(), 1);
}

#[tokio::test]
async fn message_to_closed_conversation_starts_a_new_one() {
    let h = Harness::new();
    let started = h
        .send
        .handle(SendMessageCommand::new(None, "Hello"))
        .await
        .unwrap();
    h.close
        .handle(CloseConversationCommand {
            conversation_id: started.conversation_id,
        })
        .await
        .unwrap();

    let next = h
        .send
        .handle(SendMessageCommand::new(Some(started.conversation_id), "Hello again"))
        .await
        .unwrap();

    assert_ne!(next.conversation_id, started.conversation_id);
    let old = h.store.messages(&started.conversation_id).await.unwrap();
    assert_eq!(old.len(), 1);
}
