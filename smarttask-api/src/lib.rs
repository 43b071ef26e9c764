//! # SmartTask API Server Library
//!
//! HTTP surface of SmartTask: accounts, sessions, per-user tasks with
//! sequential numbers, plan limits and AI-assisted analytics.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
