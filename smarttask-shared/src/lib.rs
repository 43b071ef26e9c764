//! # SmartTask Shared Library
//!
//! Domain logic for the SmartTask API: accounts and sessions, the task
//! lifecycle, the free-plan gate and analytics.
//!
//! ## Module Organization
//!
//! - `auth`: token service, password hashing, cookies, session extraction
//! - `models`: users and tasks
//! - `db`: PostgreSQL pool and migrations
//! - `store`: storage traits with PostgreSQL and in-memory backends
//! - `sequence`: globally unique task numbers
//! - `quota`: plan-tier task limits
//! - `tasks`: task lifecycle service
//! - `analytics`: statistics and AI-backed summaries
//! - `ai`: text-completion capability

pub mod ai;
pub mod analytics;
pub mod auth;
pub mod db;
pub mod models;
pub mod quota;
pub mod sequence;
pub mod store;
pub mod tasks;

/// Current version of the SmartTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
