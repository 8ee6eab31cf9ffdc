//! PostgreSQL implementation of ConversationStore.
//!
//! Every message or response write runs in a transaction together with the
//! owning conversation's `updated_at` bump.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::domain::conversation::{
    Conversation, ConversationStatus, Message, NewConversation, OriginInfo, ResponseOwner,
};
use crate::domain::foundation::{ConversationId, DomainError, ErrorCode, MessageId, Timestamp};
use crate::ports::{
    AttentionItem, ConversationStats, ConversationStore, ConversationSummary, DailyCount,
};

const CONVERSATION_COLUMNS: &str = "c.id, c.owner_ref, c.session_ref, c.client_address, \
     c.client_agent, c.is_active, c.is_human_takeover, c.created_at, c.updated_at";

const MESSAGE_COLUMNS: &str = "id, conversation_id, text, response_text, is_from_human, \
     is_response_from_human, is_system_message, created_at, response_at";

/// Latest message per conversation, columns prefixed with `m_`.
const LAST_MESSAGE_JOIN: &str = r#"
    LEFT JOIN LATERAL (
        SELECT m.id AS m_id, m.conversation_id AS m_conversation_id, m.text AS m_text,
               m.response_text AS m_response_text, m.is_from_human AS m_is_from_human,
               m.is_response_from_human AS m_is_response_from_human,
               m.is_system_message AS m_is_system_message, m.created_at AS m_created_at,
               m.response_at AS m_response_at
        FROM messages m
        WHERE m.conversation_id = c.id
        ORDER BY m.created_at DESC, m.id DESC
        LIMIT 1
    ) lm ON TRUE
"#;

/// PostgreSQL implementation of ConversationStore.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }

    async fn begin(&self) -> Result<Transaction<'_, Postgres>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to start transaction: {}", e)))
    }

    async fn summaries_query(
        &self,
        filter: &str,
        bind_term: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ConversationSummary>, DomainError> {
        // $1/$2 are limit/offset, $3 the optional search pattern
        let sql = format!(
            "SELECT {CONVERSATION_COLUMNS}, lm.* FROM conversations c {LAST_MESSAGE_JOIN} \
             WHERE {filter} ORDER BY c.updated_at DESC, c.id LIMIT $1 OFFSET $2"
        );
        let mut query = sqlx::query(&sql)
            .bind(i64::from(limit))
            .bind(i64::from(offset));
        if let Some(term) = bind_term {
            query = query.bind(term);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to list conversations: {}", e)))?;

        Ok(rows.iter().map(row_to_summary).collect())
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn create_conversation(&self, new: NewConversation) -> Result<Conversation, DomainError> {
        let conversation = Conversation::start(ConversationId::new(), new);

        sqlx::query(
            r#"
            INSERT INTO conversations (
                id, owner_ref, session_ref, client_address, client_agent,
                is_active, is_human_takeover, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(conversation.id().as_uuid())
        .bind(conversation.owner_ref())
        .bind(conversation.session_ref())
        .bind(&conversation.origin().client_address)
        .bind(conversation.origin().client_agent.as_deref())
        .bind(conversation.is_active())
        .bind(conversation.is_human_owned())
        .bind(conversation.created_at().as_datetime())
        .bind(conversation.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert conversation: {}", e)))?;

        Ok(conversation)
    }

    async fn find_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, DomainError> {
        let sql = format!("SELECT {CONVERSATION_COLUMNS} FROM conversations c WHERE c.id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to fetch conversation: {}", e)))?;

        Ok(row.as_ref().map(row_to_conversation))
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<Message, DomainError> {
        let now = Timestamp::now();
        let mut tx = self.begin().await?;
        touch(&mut tx, conversation_id, now).await?;

        let sql = format!(
            "INSERT INTO messages (conversation_id, text, created_at) VALUES ($1, $2, $3) \
             RETURNING {MESSAGE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(conversation_id.as_uuid())
            .bind(text)
            .bind(now.as_datetime())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DomainError::database(format!("Failed to insert message: {}", e)))?;

        commit(tx).await?;
        Ok(row_to_message(&row, ""))
    }

    async fn append_response(
        &self,
        message_id: &MessageId,
        response: &str,
        from_human: bool,
    ) -> Result<Message, DomainError> {
        let now = Timestamp::now();
        let mut tx = self.begin().await?;

        let sql = format!(
            "UPDATE messages SET response_text = $2, is_response_from_human = $3, response_at = $4 \
             WHERE id = $1 RETURNING {MESSAGE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(message_id.as_i64())
            .bind(response)
            .bind(from_human)
            .bind(now.as_datetime())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| DomainError::database(format!("Failed to store response: {}", e)))?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::MessageNotFound,
                    format!("Message not found: {}", message_id),
                )
            })?;

        let message = row_to_message(&row, "");
        touch(&mut tx, &message.conversation_id, now).await?;
        commit(tx).await?;
        Ok(message)
    }

    async fn append_system_message(
        &self,
        conversation_id: &ConversationId,
        response: &str,
    ) -> Result<Message, DomainError> {
        let now = Timestamp::now();
        let mut tx = self.begin().await?;
        touch(&mut tx, conversation_id, now).await?;

        let sql = format!(
            "INSERT INTO messages (conversation_id, text, response_text, is_system_message, \
             created_at, response_at) VALUES ($1, NULL, $2, TRUE, $3, $3) \
             RETURNING {MESSAGE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(conversation_id.as_uuid())
            .bind(response)
            .bind(now.as_datetime())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::database(format!("Failed to insert system message: {}", e))
            })?;

        commit(tx).await?;
        Ok(row_to_message(&row, ""))
    }

    async fn set_response_owner(
        &self,
        id: &ConversationId,
        owner: ResponseOwner,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE conversations SET is_human_takeover = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(owner.is_human())
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update owner: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::conversation_not_found(*id));
        }
        Ok(())
    }

    async fn close_conversation(&self, id: &ConversationId) -> Result<(), DomainError> {
        // Closing twice leaves updated_at untouched the second time.
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET updated_at = CASE WHEN is_active THEN $2 ELSE updated_at END,
                is_active = FALSE
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to close conversation: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::conversation_not_found(*id));
        }
        Ok(())
    }

    async fn list_active(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ConversationSummary>, DomainError> {
        self.summaries_query("c.is_active", None, limit, offset).await
    }

    async fn count_active(&self) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations WHERE is_active")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to count conversations: {}", e)))?;
        Ok(count as u64)
    }

    async fn messages(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, DomainError> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(conversation_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to fetch messages: {}", e)))?;

        Ok(rows.iter().map(|row| row_to_message(row, "")).collect())
    }

    async fn last_message(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Message>, DomainError> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(conversation_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to fetch last message: {}", e)))?;

        Ok(row.as_ref().map(|row| row_to_message(row, "")))
    }

    async fn statistics(&self, since: Timestamp) -> Result<ConversationStats, DomainError> {
        let totals = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM conversations) AS total_conversations,
                (SELECT COUNT(*) FROM conversations WHERE is_active) AS active_conversations,
                (SELECT COUNT(*) FROM conversations WHERE is_active AND is_human_takeover)
                    AS human_owned_conversations,
                (SELECT COUNT(*) FROM messages) AS total_messages
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch statistics: {}", e)))?;

        let daily_rows = sqlx::query(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS count
            FROM conversations
            WHERE created_at >= $1
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(since.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch daily counts: {}", e)))?;

        Ok(ConversationStats {
            total_conversations: totals.get::<i64, _>("total_conversations") as u64,
            active_conversations: totals.get::<i64, _>("active_conversations") as u64,
            human_owned_conversations: totals.get::<i64, _>("human_owned_conversations") as u64,
            total_messages: totals.get::<i64, _>("total_messages") as u64,
            daily_new_conversations: daily_rows
                .iter()
                .map(|row| DailyCount {
                    date: row.get::<NaiveDate, _>("day"),
                    count: row.get::<i64, _>("count") as u64,
                })
                .collect(),
        })
    }

    async fn needing_attention(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AttentionItem>, DomainError> {
        let sql = format!(
            r#"
            SELECT {CONVERSATION_COLUMNS}, lm.*, ua.unanswered_count
            FROM conversations c
            LEFT JOIN LATERAL (
                SELECT COUNT(*) AS unanswered_count
                FROM messages u
                WHERE u.conversation_id = c.id
                  AND u.response_text IS NULL
                  AND u.text IS NOT NULL
                  AND NOT u.is_system_message
            ) ua ON TRUE
            {LAST_MESSAGE_JOIN}
            WHERE c.is_active AND (c.is_human_takeover OR ua.unanswered_count > 0)
            ORDER BY ua.unanswered_count DESC, c.updated_at DESC, c.id
            LIMIT $1 OFFSET $2
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                DomainError::database(format!("Failed to fetch attention list: {}", e))
            })?;

        Ok(rows
            .iter()
            .map(|row| AttentionItem {
                summary: row_to_summary(row),
                unanswered_count: row.get::<i64, _>("unanswered_count") as u64,
            })
            .collect())
    }

    async fn search(
        &self,
        term: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ConversationSummary>, DomainError> {
        let pattern = format!("%{}%", escape_like(term));
        self.summaries_query(
            r#"c.is_active AND (
                c.client_address ILIKE $3
                OR EXISTS (
                    SELECT 1 FROM messages s
                    WHERE s.conversation_id = c.id
                      AND (s.text ILIKE $3 OR s.response_text ILIKE $3)
                )
            )"#,
            Some(&pattern),
            limit,
            offset,
        )
        .await
    }

    async fn purge_closed_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        // messages go with their conversation (ON DELETE CASCADE)
        let result =
            sqlx::query("DELETE FROM conversations WHERE NOT is_active AND updated_at < $1")
                .bind(cutoff.as_datetime())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to purge conversations: {}", e))
                })?;

        Ok(result.rows_affected())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════════════════

async fn touch(
    tx: &mut Transaction<'_, Postgres>,
    id: &ConversationId,
    now: Timestamp,
) -> Result<(), DomainError> {
    let result = sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
        .bind(id.as_uuid())
        .bind(now.as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to touch conversation: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(DomainError::conversation_not_found(*id));
    }
    Ok(())
}

async fn commit(tx: Transaction<'_, Postgres>) -> Result<(), DomainError> {
    tx.commit()
        .await
        .map_err(|e| DomainError::database(format!("Failed to commit transaction: {}", e)))
}

/// Escapes LIKE wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn row_to_conversation(row: &PgRow) -> Conversation {
    let id: Uuid = row.get("id");
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    Conversation::reconstitute(
        ConversationId::from_uuid(id),
        row.get("owner_ref"),
        row.get("session_ref"),
        OriginInfo::new(
            row.get::<String, _>("client_address"),
            row.get("client_agent"),
        ),
        ConversationStatus::from_active_flag(row.get("is_active")),
        ResponseOwner::from_takeover_flag(row.get("is_human_takeover")),
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    )
}

/// Reads message columns, each name preceded by `prefix`.
fn row_to_message(row: &PgRow, prefix: &str) -> Message {
    let col = |name: &str| format!("{}{}", prefix, name);
    let conversation_id: Uuid = row.get(col("conversation_id").as_str());
    let created_at: DateTime<Utc> = row.get(col("created_at").as_str());
    let response_at: Option<DateTime<Utc>> = row.get(col("response_at").as_str());

    Message {
        id: MessageId::from_i64(row.get(col("id").as_str())),
        conversation_id: ConversationId::from_uuid(conversation_id),
        text: row.get(col("text").as_str()),
        response_text: row.get(col("response_text").as_str()),
        is_from_human: row.get(col("is_from_human").as_str()),
        is_response_from_human: row.get(col("is_response_from_human").as_str()),
        is_system_message: row.get(col("is_system_message").as_str()),
        created_at: Timestamp::from_datetime(created_at),
        response_at: response_at.map(Timestamp::from_datetime),
    }
}

fn row_to_summary(row: &PgRow) -> ConversationSummary {
    let has_message = row.get::<Option<i64>, _>("m_id").is_some();
    ConversationSummary {
        conversation: row_to_conversation(row),
        last_message: has_message.then(|| row_to_message(row, "m_")),
    }
}
