//! # WorkBuddy API Server
//!
//! Serves the WorkBuddy REST API under `/api/v1` and chat rooms at `/ws`.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/workbuddy cargo run -p workbuddy-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines and `RUST_LOG` to override the
//! default filter.

use std::time::Duration;

use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use workbuddy_api::{
    app::{build_router, AppState},
    config::Config,
};
use workbuddy_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
        seed::seed_demo_data,
    },
    models::session::Session,
};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "WorkBuddy API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..DatabaseConfig::default()
    })
    .await?;

    if config.startup.run_migrations {
        run_migrations(&db).await?;
    }

    if config.startup.seed_demo_data {
        let report = seed_demo_data(&db).await?;
        tracing::info!(
            users = report.users,
            projects = report.projects,
            memberships = report.memberships,
            "Demo data seeded"
        );
    }

    tokio::spawn(sweep_expired_sessions(db.clone()));

    let addr = config.bind_address();
    let state = AppState::new(db.clone(), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(db).await;
    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "workbuddy_api=debug,workbuddy_shared=debug,tower_http=debug".into()
    });

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn sweep_expired_sessions(db: PgPool) {
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        match Session::delete_expired(&db).await {
            Ok(0) => {}
            Ok(removed) => tracing::info!(removed, "Removed expired sessions"),
            Err(e) => tracing::warn!(error = %e, "Failed to remove expired sessions"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, exiting...");
}
