/// Server-side login sessions
///
/// The cookie carries a random token; the table stores only its SHA-256 hex
/// digest (see [`crate::auth::token`]). A session holds the logged-in user and
/// the project the user last selected. Sessions expire after a fixed TTL and
/// are removed with their user.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     token_hash TEXT PRIMARY KEY,
///     user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     current_project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     expires_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};
use tracing::debug;

use super::project::ProjectRef;
use super::user::{PublicUser, UserRole};

/// Session row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub token_hash: String,
    pub user_id: String,
    pub current_project_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// An unexpired session with its user and selected project loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveSession {
    #[serde(skip)]
    pub token_hash: String,
    pub user: PublicUser,
    pub current_project: Option<ProjectRef>,
    pub expires_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ActiveSessionRow {
    token_hash: String,
    expires_at: DateTime<Utc>,
    user_id: String,
    user_name: String,
    user_email: String,
    user_role: UserRole,
    project_id: Option<String>,
    project_name: Option<String>,
}

impl From<ActiveSessionRow> for ActiveSession {
    fn from(row: ActiveSessionRow) -> Self {
        let current_project = match (row.project_id, row.project_name) {
            (Some(id), Some(name)) => Some(ProjectRef { id, name }),
            _ => None,
        };

        Self {
            token_hash: row.token_hash,
            user: PublicUser {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
                role: row.user_role,
            },
            current_project,
            expires_at: row.expires_at,
        }
    }
}

impl Session {
    /// Stores a new session that expires `ttl` from now
    pub async fn create<'e, E>(
        executor: E,
        token_hash: &str,
        user_id: &str,
        ttl: Duration,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let expires_at = Utc::now() + ttl;

        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (token_hash, user_id, expires_at)
             VALUES ($1, $2, $3)
             RETURNING token_hash, user_id, current_project_id, created_at, expires_at",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(executor)
        .await
    }

    /// Loads an unexpired session by token hash
    pub async fn find_active(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<ActiveSession>, sqlx::Error> {
        let row = sqlx::query_as::<_, ActiveSessionRow>(
            "SELECT s.token_hash, s.expires_at,
                    u.id AS user_id, u.name AS user_name, u.email::TEXT AS user_email,
                    u.role AS user_role,
                    p.id AS project_id, p.name AS project_name
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             LEFT JOIN projects p ON p.id = s.current_project_id
             WHERE s.token_hash = $1 AND s.expires_at > NOW()",
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(ActiveSession::from))
    }

    /// Records the project the session has selected
    pub async fn set_current_project<'e, E>(
        executor: E,
        token_hash: &str,
        project_id: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result =
            sqlx::query("UPDATE sessions SET current_project_id = $2 WHERE token_hash = $1")
                .bind(token_hash)
                .bind(project_id)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a session; false if it did not exist
    pub async fn delete<'e, E>(executor: E, token_hash: &str) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Purges expired sessions, returning how many were removed
    pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }
}
