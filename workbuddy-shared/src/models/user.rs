/// User model and database operations
///
/// Users carry a single flat role (Owner, Foreman or Worker); there is no
/// role hierarchy. Deleting a user keeps the tasks, comments and messages
/// they authored (their references become NULL), removes their project
/// memberships and sessions, and is refused by the database while they still
/// own a project.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('Owner', 'Foreman', 'Worker');
///
/// CREATE TABLE users (
///     id TEXT PRIMARY KEY,
///     email CITEXT NOT NULL UNIQUE,
///     name TEXT NOT NULL,
///     password_hash TEXT NOT NULL,
///     role user_role NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use workbuddy_shared::models::user::{CreateUser, User, UserRole};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     id: None,
///     email: "dana@workbuddy.pro".to_string(),
///     name: "Dana".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::Worker,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "DANA@workbuddy.pro").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Role of a user across the whole system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role")]
pub enum UserRole {
    /// Runs the company: manages users and sends invitations
    Owner,

    /// Leads crews on site
    Foreman,

    /// Works assigned tasks
    Worker,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Owner => "Owner",
            UserRole::Foreman => "Foreman",
            UserRole::Worker => "Worker",
        }
    }

    /// Roles an invitation may grant. Owners are never invited.
    pub fn is_invitable(&self) -> bool {
        matches!(self, UserRole::Foreman | UserRole::Worker)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Owner" => Ok(UserRole::Owner),
            "Foreman" => Ok(UserRole::Foreman),
            "Worker" => Ok(UserRole::Worker),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}

/// User row
///
/// The password hash is never serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: String,

    /// Unique, compared case-insensitively (CITEXT)
    pub email: String,

    pub name: String,

    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: UserRole,

    pub created_at: DateTime<Utc>,
}

/// The non-secret fields returned by login and stored in the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Id, name and role: the shape used by user and member listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub role: UserRole,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Explicit id (seeding); a UUID v4 string is generated when None
    pub id: Option<String>,

    pub email: String,

    pub name: String,

    /// Argon2id hash, NOT the plaintext password
    pub password_hash: String,

    pub role: UserRole,
}

const USER_COLUMNS: &str = "id, email::TEXT AS email, name, password_hash, role, created_at";

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// A duplicate email fails with a unique violation on `users_email_key`.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let id = data.id.unwrap_or_else(|| Uuid::new_v4().to_string());

        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, name, password_hash, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(data.email)
        .bind(data.name)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup by email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1::citext"))
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn email_exists<'e, E>(executor: E, email: &str) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1::citext)")
            .bind(email)
            .fetch_one(executor)
            .await
    }

    /// Every user except `exclude_id`, ordered by name
    pub async fn list_except(
        pool: &PgPool,
        exclude_id: &str,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, role FROM users WHERE id <> $1 ORDER BY name, id",
        )
        .bind(exclude_id)
        .fetch_all(pool)
        .await
    }

    /// Number of projects this user owns
    pub async fn owned_project_count<'e, E>(executor: E, id: &str) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE owner_id = $1")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// Hard-deletes a user
    ///
    /// Returns false if no such user existed. Fails with a foreign key
    /// violation while the user still owns a project.
    pub async fn delete<'e, E>(executor: E, id: &str) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
