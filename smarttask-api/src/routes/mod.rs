/// API route handlers
///
/// Organized by resource:
///
/// - `health`: liveness and store connectivity
/// - `auth`: register, login, refresh, logout
/// - `profile`: own account
/// - `subscription`: plan upgrade
/// - `tasks`: task lifecycle
/// - `ai`: analytics and AI-backed summaries

pub mod ai;
pub mod auth;
pub mod health;
pub mod profile;
pub mod subscription;
pub mod tasks;
