//! Shared setup for the API integration tests
//!
//! Tests need a PostgreSQL database named by `DATABASE_URL`; when it is unset
//! they return early. The schema is migrated and the demo data seeded, so the
//! demo accounts (all with password `password123`) are available:
//!
//! - `owner@workbuddy.pro` (owner01, Owner)
//! - `alice@workbuddy.pro` (foremanA, Foreman)
//! - `bob@workbuddy.pro` (workerX, Worker)
//! - `carol@workbuddy.pro` (workerY, Worker)

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;
use workbuddy_api::{
    app::{build_router, AppState},
    config::Config,
};
use workbuddy_shared::db::{
    migrations::{ensure_database_exists, run_migrations},
    pool::{create_pool, DatabaseConfig},
    seed::seed_demo_data,
};

pub const DEMO_PASSWORD: &str = "password123";
pub const OWNER_EMAIL: &str = "owner@workbuddy.pro";
pub const FOREMAN_EMAIL: &str = "alice@workbuddy.pro";
pub const WORKER_EMAIL: &str = "carol@workbuddy.pro";

/// Test context containing the router and its state
pub struct TestContext {
    pub state: AppState,
    pub app: Router,
}

impl TestContext {
    /// Migrated and seeded context, or None when no database is configured
    pub async fn new() -> Option<Self> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping API test");
            return None;
        };

        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some(url.clone()),
            "PUBLIC_BASE_URL" => Some("https://app.workbuddy.test".to_string()),
            _ => None,
        })
        .expect("Test config should load");

        ensure_database_exists(&url)
            .await
            .expect("Failed to create database");

        let db = create_pool(DatabaseConfig {
            url,
            max_connections: 5,
            ..Default::default()
        })
        .await
        .expect("Failed to create pool");

        run_migrations(&db).await.expect("Migrations failed");
        seed_demo_data(&db).await.expect("Seeding failed");

        let state = AppState::new(db, config);
        let app = build_router(state.clone());

        Some(Self { state, app })
    }

    /// Logs in and returns the `name=value` pair to send as `Cookie`
    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, cookie, body) = self
            .send_raw(
                "POST",
                "/api/v1/login",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        let cookie = cookie.expect("Login should set a cookie");
        cookie
            .split(';')
            .next()
            .expect("Cookie should have a value")
            .to_string()
    }

    pub async fn login_owner(&self) -> String {
        self.login(OWNER_EMAIL, DEMO_PASSWORD).await
    }

    /// Sends a request and returns the status with the parsed JSON body
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, body) = self.send_raw(method, uri, cookie, body).await;
        (status, body)
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> (StatusCode, Value) {
        self.send("GET", uri, Some(cookie), None).await
    }

    pub async fn post(&self, uri: &str, cookie: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(cookie), Some(body)).await
    }

    pub async fn put(&self, uri: &str, cookie: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(cookie), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, cookie: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, Some(cookie), None).await
    }

    async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, set_cookie, json)
    }
}

/// Short random suffix so concurrent tests never collide
pub fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}
