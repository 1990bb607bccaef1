//! SnapList API - REST backend for trackable QR codes.
//!
//! # Architecture
//!
//! - Axum web framework, JSON everywhere (camelCase)
//! - `PostgreSQL` via sqlx behind per-aggregate store traits ([`db`])
//! - Cookie sessions via tower-sessions
//! - Transactional email via SMTP (lettre) and Askama templates
//!
//! The `snaplist-api` binary serves [`routes::app`]; `snaplist-cli` reuses the
//! same config, stores and services for operator tasks.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use config::AppConfig;
pub use state::AppState;
