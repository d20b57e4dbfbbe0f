/// Project membership: a pure (project, user) join record
///
/// Deleting either the project or the user removes the membership. Task
/// assignment relies on [`ensure_membership`] to keep every assignee a member
/// of the task's project.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_members (
///     project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use tracing::info;

use super::user::UserSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub project_id: String,
    pub user_id: String,
}

/// Makes `user_id` a member of `project_id` if it is not one already
///
/// Returns true when a membership row was inserted and false when the user
/// was already a member. Safe to call concurrently for the same pair.
///
/// # Errors
///
/// Fails with a foreign key violation if the project or user does not exist.
pub async fn ensure_membership<'e, E>(
    executor: E,
    project_id: &str,
    user_id: &str,
) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO project_members (project_id, user_id)
         VALUES ($1, $2)
         ON CONFLICT (project_id, user_id) DO NOTHING",
    )
    .bind(project_id)
    .bind(user_id)
    .execute(executor)
    .await?;

    let inserted = result.rows_affected() > 0;
    if inserted {
        info!(project_id, user_id, "Auto-enrolled user as project member");
    }

    Ok(inserted)
}

impl ProjectMember {
    pub async fn is_member<'e, E>(
        executor: E,
        project_id: &str,
        user_id: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM project_members
                WHERE project_id = $1 AND user_id = $2
            )",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    /// Members of a project with their display name and role, ordered by name
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: &str,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.name, u.role
             FROM project_members pm
             JOIN users u ON u.id = pm.user_id
             WHERE pm.project_id = $1
             ORDER BY u.name, u.id",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
