/// Database models for WorkBuddy
///
/// One module per table, each owning its row type and CRUD operations.
/// Writes that may run inside a transaction are generic over
/// `sqlx::PgExecutor`, so callers pass either `&PgPool` or `&mut *tx`.
///
/// # Models
///
/// - `user`: accounts and the flat `UserRole`
/// - `project`: projects and their owner
/// - `project_member`: membership join records and `ensure_membership`
/// - `task`: tasks, partial updates and assignee auto-enrollment
/// - `comment`: task comments
/// - `message`: chat messages keyed by an opaque conversation id
/// - `invitation`: pending project invitations
/// - `session`: server-side login sessions
///
/// # Example
///
/// ```no_run
/// use workbuddy_shared::models::project_member::ensure_membership;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let mut tx = pool.begin().await?;
/// ensure_membership(&mut *tx, "proj_alpha", "workerY").await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

pub mod comment;
pub mod invitation;
pub mod message;
pub mod project;
pub mod project_member;
pub mod session;
pub mod task;
pub mod user;
