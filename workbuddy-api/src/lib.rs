//! # WorkBuddy API Server Library
//!
//! HTTP and WebSocket surface of WorkBuddy, built on Axum.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from environment variables
//! - `error`: error handling and HTTP response mapping
//! - `extract`: JSON body extractor with API-shaped rejections
//! - `middleware`: session authentication and security headers
//! - `routes`: route handlers, one module per resource

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
