/// Demo data for local development and the integration tests
///
/// Inserts a small construction company: one Owner, one Foreman, two Workers,
/// two projects owned by the Owner, and memberships for Project Alpha. Every
/// account uses the password `password123`.
///
/// Seeding is idempotent. Existing rows (matched by primary key) are left
/// untouched, so it is safe to run on every startup.

use sqlx::PgPool;
use tracing::info;

use crate::auth::password::{hash_password, PasswordError};
use crate::models::project_member::ensure_membership;
use crate::models::user::UserRole;

/// Shared password of every demo account
pub const DEMO_PASSWORD: &str = "password123";

/// (id, email, name, role)
pub const DEMO_USERS: [(&str, &str, &str, UserRole); 4] = [
    ("owner01", "owner@workbuddy.pro", "Owner User", UserRole::Owner),
    ("foremanA", "alice@workbuddy.pro", "Foreman Alice", UserRole::Foreman),
    ("workerX", "bob@workbuddy.pro", "Worker Bob", UserRole::Worker),
    ("workerY", "carol@workbuddy.pro", "Worker Carol", UserRole::Worker),
];

/// (id, name, description); all owned by `owner01`
pub const DEMO_PROJECTS: [(&str, &str, &str); 2] = [
    (
        "proj_alpha",
        "Project Alpha - Downtown Renovation",
        "Complete renovation of the old library building.",
    ),
    (
        "proj_beta",
        "Site Beta - Highway Expansion",
        "Phase 2 of the western highway expansion.",
    ),
];

/// (project_id, user_id)
pub const DEMO_MEMBERS: [(&str, &str); 3] = [
    ("proj_alpha", "owner01"),
    ("proj_alpha", "foremanA"),
    ("proj_alpha", "workerX"),
];

/// Error type for seeding
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Rows actually inserted by one seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: u64,
    pub projects: u64,
    pub memberships: u64,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        *self == SeedReport::default()
    }
}

/// Inserts any missing demo rows in one transaction
pub async fn seed_demo_data(pool: &PgPool) -> Result<SeedReport, SeedError> {
    let password_hash = hash_password(DEMO_PASSWORD)?;
    let mut report = SeedReport::default();
    let mut tx = pool.begin().await?;

    for (id, email, name, role) in DEMO_USERS {
        let result = sqlx::query(
            "INSERT INTO users (id, email, name, password_hash, role)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(email)
        .bind(name)
        .bind(&password_hash)
        .bind(role)
        .execute(&mut *tx)
        .await?;
        report.users += result.rows_affected();
    }

    for (id, name, description) in DEMO_PROJECTS {
        let result = sqlx::query(
            "INSERT INTO projects (id, name, description, owner_id)
             VALUES ($1, $2, $3, 'owner01')
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .execute(&mut *tx)
        .await?;
        report.projects += result.rows_affected();
    }

    for (project_id, user_id) in DEMO_MEMBERS {
        if ensure_membership(&mut *tx, project_id, user_id).await? {
            report.memberships += 1;
        }
    }

    tx.commit().await?;

    if report.is_empty() {
        info!("Demo data already present");
    } else {
        info!(
            users = report.users,
            projects = report.projects,
            memberships = report.memberships,
            "Seeded demo data"
        );
    }

    Ok(report)
}
