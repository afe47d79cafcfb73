use async_trait::async_trait;
use chrono::Utc;
use rusqlite::OptionalExtension;

use crate::db::Database;
use crate::error::ServerError;
use crate::models::{Conversation, ConversationStatus, MessageRecord};
use crate::workflow::engine::TranscriptSink;
use crate::workflow::error::WorkflowError;
use crate::workflow::state::Message;

#[derive(Clone)]
pub struct ConversationStore {
    db: Database,
}

impl ConversationStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a new conversation row for a use case.
    pub async fn create(&self, use_case_id: &str) -> Result<Conversation, ServerError> {
        let conversation = Conversation::new(
            uuid::Uuid::new_v4().to_string(),
            use_case_id.to_string(),
        );
        let c = conversation.clone();
        self.db
            .with_conn_async(move |conn| {
                conn.execute(
                    "INSERT INTO conversations (id, use_case_id, status, failure_reason, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        c.id,
                        c.use_case_id,
                        c.status.as_str(),
                        c.failure_reason,
                        c.created_at.timestamp_millis(),
                        c.updated_at.timestamp_millis(),
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(conversation)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Conversation>, ServerError> {
        let id = id.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, use_case_id, status, failure_reason, created_at, updated_at
                     FROM conversations WHERE id = ?1",
                )?;
                stmt.query_row(rusqlite::params![id], |row| Ok(row_to_conversation(row)))
                    .optional()
            })
            .await
    }

    pub async fn list_by_use_case(
        &self,
        use_case_id: &str,
    ) -> Result<Vec<Conversation>, ServerError> {
        let uc_id = use_case_id.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, use_case_id, status, failure_reason, created_at, updated_at
                     FROM conversations WHERE use_case_id = ?1 ORDER BY created_at DESC",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![uc_id], |row| Ok(row_to_conversation(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// Append one transcript row. `position` serializes writes per
    /// conversation: the unique index rejects duplicate positions.
    pub async fn append_message(
        &self,
        conversation_id: &str,
        sender: &str,
        content: &str,
        position: usize,
    ) -> Result<(), ServerError> {
        let conv_id = conversation_id.to_string();
        let sender = sender.to_string();
        let content = content.to_string();
        let now = Utc::now().timestamp_millis();
        self.db
            .with_conn_async(move |conn| {
                conn.execute(
                    "INSERT INTO messages (id, conversation_id, sender, content, position, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        uuid::Uuid::new_v4().to_string(),
                        conv_id,
                        sender,
                        content,
                        position as i64,
                        now,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Load a conversation's transcript in order.
    pub async fn transcript(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<MessageRecord>, ServerError> {
        let conv_id = conversation_id.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, conversation_id, sender, content, position, created_at
                     FROM messages WHERE conversation_id = ?1 ORDER BY position ASC",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![conv_id], |row| Ok(row_to_message(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    pub async fn mark_terminated(&self, conversation_id: &str) -> Result<(), ServerError> {
        self.update_status(conversation_id, ConversationStatus::Terminated, None)
            .await
    }

    pub async fn mark_failed(
        &self,
        conversation_id: &str,
        reason: &str,
    ) -> Result<(), ServerError> {
        self.update_status(
            conversation_id,
            ConversationStatus::Failed,
            Some(reason.to_string()),
        )
        .await
    }

    async fn update_status(
        &self,
        conversation_id: &str,
        status: ConversationStatus,
        failure_reason: Option<String>,
    ) -> Result<(), ServerError> {
        let conv_id = conversation_id.to_string();
        let status_str = status.as_str().to_string();
        let now = Utc::now().timestamp_millis();
        self.db
            .with_conn_async(move |conn| {
                conn.execute(
                    "UPDATE conversations SET status = ?1, failure_reason = ?2, updated_at = ?3
                     WHERE id = ?4",
                    rusqlite::params![status_str, failure_reason, now, conv_id],
                )?;
                Ok(())
            })
            .await
    }
}

/// A `TranscriptSink` that writes each appended message to one
/// conversation's transcript. Write failures surface as the persistence
/// error kind, keeping them distinct from routing/generation failures.
pub struct ConversationSink {
    store: ConversationStore,
    conversation_id: String,
}

impl ConversationSink {
    pub fn new(store: ConversationStore, conversation_id: String) -> Self {
        Self {
            store,
            conversation_id,
        }
    }
}

#[async_trait]
impl TranscriptSink for ConversationSink {
    async fn append(&self, position: usize, message: &Message) -> Result<(), WorkflowError> {
        self.store
            .append_message(&self.conversation_id, &message.sender, &message.content, position)
            .await
            .map_err(|e| WorkflowError::Persistence(e.to_string()))
    }
}

use rusqlite::Row;

fn row_to_conversation(row: &Row<'_>) -> Conversation {
    let created_ms: i64 = row.get(4).unwrap_or(0);
    let updated_ms: i64 = row.get(5).unwrap_or(0);

    Conversation {
        id: row.get(0).unwrap_or_default(),
        use_case_id: row.get(1).unwrap_or_default(),
        status: ConversationStatus::from_str(&row.get::<_, String>(2).unwrap_or_default()),
        failure_reason: row.get(3).unwrap_or(None),
        created_at: chrono::DateTime::from_timestamp_millis(created_ms)
            .unwrap_or_else(Utc::now),
        updated_at: chrono::DateTime::from_timestamp_millis(updated_ms)
            .unwrap_or_else(Utc::now),
    }
}

fn row_to_message(row: &Row<'_>) -> MessageRecord {
    let created_ms: i64 = row.get(5).unwrap_or(0);

    MessageRecord {
        id: row.get(0).unwrap_or_default(),
        conversation_id: row.get(1).unwrap_or_default(),
        sender: row.get(2).unwrap_or_default(),
        content: row.get(3).unwrap_or_default(),
        position: row.get::<_, i64>(4).unwrap_or(0) as u32,
        created_at: chrono::DateTime::from_timestamp_millis(created_ms)
            .unwrap_or_else(Utc::now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UseCase;
    use crate::store::UseCaseStore;

    async fn stores() -> (UseCaseStore, ConversationStore) {
        let db = Database::open_in_memory().unwrap();
        (UseCaseStore::new(db.clone()), ConversationStore::new(db))
    }

    async fn seeded_conversation(
        use_cases: &UseCaseStore,
        conversations: &ConversationStore,
    ) -> Conversation {
        use_cases
            .save(&UseCase::new("uc-1".to_string(), "demo".to_string()))
            .await
            .unwrap();
        conversations.create("uc-1").await.unwrap()
    }

    #[tokio::test]
    async fn test_transcript_round_trip_in_position_order() {
        let (use_cases, conversations) = stores().await;
        let conv = seeded_conversation(&use_cases, &conversations).await;

        conversations
            .append_message(&conv.id, "user", "I want a haircut", 0)
            .await
            .unwrap();
        conversations
            .append_message(&conv.id, "supervisor", "Intake", 1)
            .await
            .unwrap();
        conversations
            .append_message(&conv.id, "Intake", "Got it, name please?", 2)
            .await
            .unwrap();

        let transcript = conversations.transcript(&conv.id).await.unwrap();
        let senders: Vec<&str> = transcript.iter().map(|m| m.sender.as_str()).collect();
        assert_eq!(senders, vec!["user", "supervisor", "Intake"]);
        assert_eq!(transcript[2].content, "Got it, name please?");
    }

    #[tokio::test]
    async fn test_duplicate_position_is_rejected() {
        let (use_cases, conversations) = stores().await;
        let conv = seeded_conversation(&use_cases, &conversations).await;

        conversations
            .append_message(&conv.id, "user", "first", 0)
            .await
            .unwrap();
        let err = conversations
            .append_message(&conv.id, "user", "second", 0)
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let (use_cases, conversations) = stores().await;
        let conv = seeded_conversation(&use_cases, &conversations).await;
        assert_eq!(conv.status, ConversationStatus::Running);

        conversations.mark_terminated(&conv.id).await.unwrap();
        let loaded = conversations.get(&conv.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ConversationStatus::Terminated);

        conversations
            .mark_failed(&conv.id, "routing error: no valid decision")
            .await
            .unwrap();
        let loaded = conversations.get(&conv.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ConversationStatus::Failed);
        assert_eq!(
            loaded.failure_reason.as_deref(),
            Some("routing error: no valid decision")
        );
    }

    #[tokio::test]
    async fn test_sink_appends_through_the_store() {
        let (use_cases, conversations) = stores().await;
        let conv = seeded_conversation(&use_cases, &conversations).await;

        let sink = ConversationSink::new(conversations.clone(), conv.id.clone());
        sink.append(0, &Message::user("hello")).await.unwrap();
        sink.append(1, &Message::supervisor("Intake")).await.unwrap();

        let transcript = conversations.transcript(&conv.id).await.unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].sender, "supervisor");
    }
}
