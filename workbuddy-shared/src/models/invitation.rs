/// Invitations to join a project
///
/// An Owner invites an email address into a project with a Foreman or Worker
/// role. The generated token is embedded in a registration link; nothing is
/// emailed. At most one invitation per email can be pending at a time, which
/// the partial unique index `invitations_pending_email_key` enforces.
///
/// Accepting an invitation is not supported yet, so `accepted_at` and
/// `accepted_by_user_id` stay NULL for now.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use super::user::UserRole;
use crate::auth::token::generate_invitation_token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
}

/// Invitation row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: i64,
    pub token: String,
    pub email: String,
    pub project_id: String,
    pub role: UserRole,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_by_user_id: Option<String>,
}

/// Input for creating an invitation
#[derive(Debug, Clone)]
pub struct CreateInvitation {
    pub email: String,
    pub project_id: String,
    /// Foreman or Worker
    pub role: UserRole,
}

const INVITATION_COLUMNS: &str = "id, token, email::TEXT AS email, project_id, role, status, \
                                  created_at, accepted_at, accepted_by_user_id";

impl Invitation {
    /// Inserts a pending invitation with a fresh random token
    ///
    /// # Errors
    ///
    /// Fails with a unique violation when a pending invitation already exists
    /// for the email, and with a foreign key violation for an unknown project.
    pub async fn create<'e, E>(executor: E, data: CreateInvitation) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Invitation>(&format!(
            "INSERT INTO invitations (token, email, project_id, role, status)
             VALUES ($1, $2, $3, $4, 'pending')
             RETURNING {INVITATION_COLUMNS}"
        ))
        .bind(generate_invitation_token())
        .bind(data.email)
        .bind(data.project_id)
        .bind(data.role)
        .fetch_one(executor)
        .await
    }

    /// Whether a pending invitation exists for `email` (case-insensitive)
    pub async fn pending_exists_for_email<'e, E>(
        executor: E,
        email: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM invitations
                WHERE email = $1::citext AND status = 'pending'
            )",
        )
        .bind(email)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(pool)
        .await
    }
}

/// Registration link an invitee opens
pub fn invite_link(public_base_url: &str, token: &str) -> String {
    format!(
        "{}/register?token={}",
        public_base_url.trim_end_matches('/'),
        token
    )
}
