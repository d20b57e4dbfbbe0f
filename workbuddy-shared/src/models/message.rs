/// Chat messages
///
/// `conversation_id` is an opaque string; there is no conversation table and
/// no participant list. Messages are read back in creation order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Message row with the sender's display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub conversation_id: String,
    pub user_id: Option<String>,
    /// None once the sender has been deleted
    pub user_name: Option<String>,
    pub message_text: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Persists a message and returns it with the sender's name
    pub async fn create<'e, E>(
        executor: E,
        conversation_id: &str,
        user_id: &str,
        message_text: &str,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Message>(
            "WITH inserted AS (
                INSERT INTO messages (conversation_id, user_id, message_text)
                VALUES ($1, $2, $3)
                RETURNING id, conversation_id, user_id, message_text, created_at
             )
             SELECT i.id, i.conversation_id, i.user_id, u.name AS user_name,
                    i.message_text, i.created_at
             FROM inserted i
             LEFT JOIN users u ON u.id = i.user_id",
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(message_text)
        .fetch_one(executor)
        .await
    }

    /// Messages of a conversation, oldest first
    pub async fn list_for_conversation(
        pool: &PgPool,
        conversation_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            "SELECT m.id, m.conversation_id, m.user_id, u.name AS user_name,
                    m.message_text, m.created_at
             FROM messages m
             LEFT JOIN users u ON u.id = m.user_id
             WHERE m.conversation_id = $1
             ORDER BY m.created_at ASC, m.id ASC",
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_for_conversation(
        pool: &PgPool,
        conversation_id: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .fetch_one(pool)
            .await
    }
}
