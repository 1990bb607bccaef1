//! SnapList Core - Shared types library.
//!
//! This crate provides common types used across all SnapList components:
//! - `api` - REST backend consumed by the single-page frontend
//! - `cli` - Command-line tools for migrations, seeding and order operations
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, short codes, tier names and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
