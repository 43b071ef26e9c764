/// User account model
///
/// A user owns tasks and carries a plan tier that decides whether the
/// free-tier task ceiling applies. Password hashes never leave the
/// backend: the public projection used in HTTP responses is [`UserProfile`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     email TEXT NOT NULL,            -- unique on LOWER(email)
///     password_hash TEXT NOT NULL,
///     name TEXT NOT NULL DEFAULT '',
///     plan TEXT NOT NULL DEFAULT 'free',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Capped number of tasks
    Free,

    /// No task ceiling
    Premium,
}

impl PlanTier {
    /// Converts plan to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Premium => "premium",
        }
    }

    /// Parses plan from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(PlanTier::Free),
            "premium" => Some(PlanTier::Premium),
            _ => None,
        }
    }
}

impl Default for PlanTier {
    fn default() -> Self {
        PlanTier::Free
    }
}

/// User account
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Normalized (trimmed, lower-cased) email address
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Display name, empty when never set
    pub name: String,

    /// Current plan tier
    pub plan: PlanTier,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public view of the account, safe to serialize into responses
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.plan,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Serializable account projection without the password hash
///
/// The plan tier is exposed as `role` to stay wire-compatible with existing
/// clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: PlanTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address, normalized by the store before insertion
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// Display name
    pub name: String,
}

/// Trims and lower-cases an email address
///
/// Every lookup and insert goes through this so that uniqueness and
/// login are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
