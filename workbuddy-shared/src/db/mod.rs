/// Database layer for WorkBuddy
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: sqlx migration runner for the `migrations/` directory
/// - `seed`: idempotent demo data (users, projects, memberships)
///
/// Models live in the `models` module at crate root level.
///
/// # Example
///
/// ```no_run
/// use workbuddy_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     workbuddy_shared::db::migrations::run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
pub mod seed;
