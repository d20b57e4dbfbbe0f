/// Project model and database operations
///
/// A project is owned by exactly one user. The owner cannot be deleted while
/// the project exists (`ON DELETE RESTRICT`).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id TEXT PRIMARY KEY,
///     name TEXT NOT NULL,
///     description TEXT,
///     owner_id TEXT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Project row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Id and name of the project a session has selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    pub name: String,
}

impl From<&Project> for ProjectRef {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
        }
    }
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    /// Explicit id (seeding); a UUID v4 string is generated when None
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
}

const PROJECT_COLUMNS: &str = "id, name, description, owner_id, created_at, updated_at";

impl Project {
    pub async fn create<'e, E>(executor: E, data: CreateProject) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let id = data.id.unwrap_or_else(|| Uuid::new_v4().to_string());

        sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (id, name, description, owner_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn exists<'e, E>(executor: E, id: &str) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// All projects ordered by name
    ///
    /// Not filtered by membership: every logged-in user sees every project.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY name, id"
        ))
        .fetch_all(pool)
        .await
    }
}
