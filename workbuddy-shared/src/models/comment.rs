/// Task comments
///
/// Comments are deleted with their task. The author reference is nulled when
/// the author is deleted, so listings use a LEFT JOIN and may return a
/// comment without a `user_name`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Comment row with the author's display name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub task_id: i64,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub comment_text: String,
    /// Flags the comment as a site alert
    pub is_alert: bool,
    pub media_attachments: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for adding a comment
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub task_id: i64,
    pub user_id: String,
    /// Already trimmed and non-empty
    pub comment_text: String,
    pub is_alert: bool,
    pub media_attachments: Option<String>,
}

impl Comment {
    /// Inserts a comment and returns it with the author's name
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if the task does not exist.
    pub async fn create<'e, E>(executor: E, data: CreateComment) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Comment>(
            "WITH inserted AS (
                INSERT INTO comments (task_id, user_id, comment_text, is_alert, media_attachments)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, task_id, user_id, comment_text, is_alert, media_attachments, created_at
             )
             SELECT i.id, i.task_id, i.user_id, u.name AS user_name, i.comment_text,
                    i.is_alert, i.media_attachments, i.created_at
             FROM inserted i
             LEFT JOIN users u ON u.id = i.user_id",
        )
        .bind(data.task_id)
        .bind(data.user_id)
        .bind(data.comment_text)
        .bind(data.is_alert)
        .bind(data.media_attachments)
        .fetch_one(executor)
        .await
    }

    /// Comments on a task, oldest first
    pub async fn list_for_task(pool: &PgPool, task_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            "SELECT c.id, c.task_id, c.user_id, u.name AS user_name, c.comment_text,
                    c.is_alert, c.media_attachments, c.created_at
             FROM comments c
             LEFT JOIN users u ON u.id = c.user_id
             WHERE c.task_id = $1
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }
}
