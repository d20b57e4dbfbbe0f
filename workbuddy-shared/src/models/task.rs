/// Task model and database operations
///
/// Tasks belong to a project and are hard-deleted together with their
/// comments. `status` is free text; a task counts as completed when its status
/// is exactly `"Done"`.
///
/// Whenever a task gets an assignee, that user is enrolled as a member of the
/// task's project inside the same transaction (see [`create_task`] and
/// [`update_task`]).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('Low', 'Medium', 'High');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title TEXT NOT NULL,
///     description TEXT,
///     status TEXT NOT NULL DEFAULT 'To Do',
///     priority task_priority NOT NULL DEFAULT 'Medium',
///     due_date TEXT,
///     creator_id TEXT REFERENCES users(id) ON DELETE SET NULL,
///     assignee_id TEXT REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{PgExecutor, PgPool};
use tracing::debug;

use super::project_member::ensure_membership;

/// Status value that marks a task as completed
pub const DONE_STATUS: &str = "Done";

/// Status given to new tasks
pub const DEFAULT_STATUS: &str = "To Do";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Sequential id
    pub id: i64,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: TaskPriority,
    /// Free-form, not validated
    pub due_date: Option<String>,
    pub creator_id: Option<String>,
    pub assignee_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == DONE_STATUS
    }
}

/// A task with its assignee's name resolved, as returned by the API
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: Task,

    /// None when unassigned or the assignee was deleted
    pub assignee_name: Option<String>,

    /// `status == "Done"`
    pub is_completed: bool,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<String>,
    pub creator_id: String,
    /// Resolved assignee; callers default this to the creator
    pub assignee_id: String,
}

/// Partial update of a task
///
/// Absent fields keep their current value. For the nullable fields the outer
/// `Option` tracks presence and the inner one the value, so an explicit JSON
/// `null` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateTask {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub assignee_id: Option<Option<String>>,
}

/// Maps a present field (including `null`) to `Some`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateTask {
    /// True when the request supplied no fields at all
    pub fn is_empty(&self) -> bool {
        *self == UpdateTask::default()
    }

    /// Overwrites exactly the supplied fields of `task`
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(assignee_id) = self.assignee_id {
            task.assignee_id = assignee_id;
        }
    }
}

const TASK_COLUMNS: &str = "id, project_id, title, description, status, priority, due_date, \
                            creator_id, assignee_id, created_at, updated_at";

const TASK_DETAIL_SELECT: &str = "SELECT t.id, t.project_id, t.title, t.description, t.status, \
                                  t.priority, t.due_date, t.creator_id, t.assignee_id, \
                                  t.created_at, t.updated_at, \
                                  u.name AS assignee_name, \
                                  (t.status = 'Done') AS is_completed \
                                  FROM tasks t \
                                  LEFT JOIN users u ON u.id = t.assignee_id";

impl Task {
    pub async fn insert<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (project_id, title, description, status, priority, due_date,
                                creator_id, assignee_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.description)
        .bind(DEFAULT_STATUS)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.creator_id)
        .bind(data.assignee_id)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Loads a task and locks its row until the transaction ends
    pub async fn find_for_update<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn exists<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tasks WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// Writes every mutable column of `task` back and bumps `updated_at`
    pub async fn save<'e, E>(executor: E, task: &Task) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = $2, description = $3, status = $4, priority = $5,
                 due_date = $6, assignee_id = $7, updated_at = NOW()
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.status)
        .bind(task.priority)
        .bind(&task.due_date)
        .bind(&task.assignee_id)
        .fetch_one(executor)
        .await
    }

    /// Hard delete; comments cascade. Returns false if the task did not exist.
    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_detail(pool: &PgPool, id: i64) -> Result<Option<TaskDetail>, sqlx::Error> {
        sqlx::query_as::<_, TaskDetail>(&format!("{TASK_DETAIL_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Tasks of a project, newest first
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: &str,
    ) -> Result<Vec<TaskDetail>, sqlx::Error> {
        sqlx::query_as::<_, TaskDetail>(&format!(
            "{TASK_DETAIL_SELECT} WHERE t.project_id = $1 ORDER BY t.created_at DESC, t.id DESC"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}

/// Creates a task and enrolls its assignee in one transaction
///
/// # Errors
///
/// Fails with a foreign key violation if the project or assignee does not
/// exist; nothing is written in that case.
pub async fn create_task(pool: &PgPool, data: CreateTask) -> Result<TaskDetail, sqlx::Error> {
    let mut tx = pool.begin().await?;

    ensure_membership(&mut *tx, &data.project_id, &data.assignee_id).await?;
    let task = Task::insert(&mut *tx, data).await?;

    tx.commit().await?;
    debug!(task_id = task.id, project_id = %task.project_id, "Task created");

    Task::find_detail(pool, task.id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Applies a partial update in one transaction
///
/// Returns `Ok(None)` if the task does not exist. An empty update returns the
/// task untouched. A new non-null assignee is enrolled in the project.
pub async fn update_task(
    pool: &PgPool,
    id: i64,
    changes: UpdateTask,
) -> Result<Option<TaskDetail>, sqlx::Error> {
    if changes.is_empty() {
        return Task::find_detail(pool, id).await;
    }

    let mut tx = pool.begin().await?;

    let Some(mut task) = Task::find_for_update(&mut *tx, id).await? else {
        return Ok(None);
    };

    changes.apply(&mut task);

    if let Some(assignee_id) = task.assignee_id.as_deref() {
        ensure_membership(&mut *tx, &task.project_id, assignee_id).await?;
    }
    Task::save(&mut *tx, &task).await?;

    tx.commit().await?;
    debug!(task_id = id, "Task updated");

    Task::find_detail(pool, id).await
}
