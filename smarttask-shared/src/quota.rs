/// Plan-based task ceiling
///
/// Free accounts may own a limited number of tasks (10 by default);
/// premium accounts are unlimited. The check runs before a sequence number
/// is allocated, so rejected creations never consume one.
///
/// The count and the subsequent insert are separate operations: two
/// concurrent creations by the same free user can both pass the check at
/// `limit - 1` and end one over the ceiling.
///
/// # Example
///
/// ```
/// use smarttask_shared::quota::{PlanGate, QuotaLimits};
/// use smarttask_shared::store::Stores;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stores = Stores::in_memory();
/// let gate = PlanGate::new(stores.users.clone(), stores.tasks.clone(), QuotaLimits::default());
///
/// // Unknown users are rejected with QuotaError::UserNotFound
/// assert!(gate.enforce(Uuid::new_v4()).await.is_err());
/// # Ok(())
/// # }
/// ```

use crate::models::user::PlanTier;
use crate::store::{StoreError, TaskStore, UserStore};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Default task ceiling for free accounts
pub const DEFAULT_FREE_TASK_LIMIT: u64 = 10;

/// Quota enforcement error
#[derive(Debug)]
pub enum QuotaError {
    /// Task ceiling reached
    LimitExceeded { limit: u64, current: u64 },

    /// Storage error
    Store(StoreError),

    /// Account not found
    UserNotFound(Uuid),
}

impl fmt::Display for QuotaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaError::LimitExceeded { limit, .. } => write!(
                f,
                "Free plan limit reached ({} tasks). Upgrade to add more.",
                limit
            ),
            QuotaError::Store(err) => write!(f, "Storage error: {}", err),
            QuotaError::UserNotFound(id) => write!(f, "User not found: {}", id),
        }
    }
}

impl std::error::Error for QuotaError {}

impl From<StoreError> for QuotaError {
    fn from(err: StoreError) -> Self {
        QuotaError::Store(err)
    }
}

/// Task ceilings per plan
#[derive(Debug, Clone, Copy)]
pub struct QuotaLimits {
    /// Maximum tasks a free account may own
    pub free_tasks: u64,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            free_tasks: DEFAULT_FREE_TASK_LIMIT,
        }
    }
}

impl QuotaLimits {
    /// Ceiling for a plan, `None` meaning unlimited
    pub fn for_plan(&self, plan: PlanTier) -> Option<u64> {
        match plan {
            PlanTier::Free => Some(self.free_tasks),
            PlanTier::Premium => None,
        }
    }
}

/// Result of a quota check
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaCheckResult {
    /// Whether another task may be created
    pub allowed: bool,

    /// Tasks currently owned (0 when the plan is unlimited and nothing was counted)
    pub current: u64,

    /// Ceiling, `None` for unlimited plans
    pub limit: Option<u64>,
}

impl QuotaCheckResult {
    pub fn unlimited() -> Self {
        QuotaCheckResult {
            allowed: true,
            current: 0,
            limit: None,
        }
    }

    pub fn allowed(current: u64, limit: u64) -> Self {
        QuotaCheckResult {
            allowed: true,
            current,
            limit: Some(limit),
        }
    }

    pub fn exceeded(current: u64, limit: u64) -> Self {
        QuotaCheckResult {
            allowed: false,
            current,
            limit: Some(limit),
        }
    }

    /// Remaining creations, `None` for unlimited plans
    pub fn remaining(&self) -> Option<u64> {
        self.limit.map(|limit| limit.saturating_sub(self.current))
    }
}

/// Checks task ownership against the account's plan ceiling
#[derive(Clone)]
pub struct PlanGate {
    users: Arc<dyn UserStore>,
    tasks: Arc<dyn TaskStore>,
    limits: QuotaLimits,
}

impl PlanGate {
    pub fn new(users: Arc<dyn UserStore>, tasks: Arc<dyn TaskStore>, limits: QuotaLimits) -> Self {
        PlanGate {
            users,
            tasks,
            limits,
        }
    }

    /// Reads the plan and, for capped plans only, counts owned tasks
    ///
    /// # Errors
    ///
    /// Returns `QuotaError::UserNotFound` for unknown accounts and
    /// `QuotaError::Store` on storage failure.
    pub async fn check(&self, owner_id: Uuid) -> Result<QuotaCheckResult, QuotaError> {
        let user = self
            .users
            .find_by_id(owner_id)
            .await?
            .ok_or(QuotaError::UserNotFound(owner_id))?;

        let Some(limit) = self.limits.for_plan(user.plan) else {
            return Ok(QuotaCheckResult::unlimited());
        };

        let current = self.tasks.count(owner_id).await?;
        if current >= limit {
            Ok(QuotaCheckResult::exceeded(current, limit))
        } else {
            Ok(QuotaCheckResult::allowed(current, limit))
        }
    }

    /// Like [`check`](Self::check) but fails when the ceiling is reached
    ///
    /// # Errors
    ///
    /// Returns `QuotaError::LimitExceeded` when the account owns
    /// `limit` or more tasks.
    pub async fn enforce(&self, owner_id: Uuid) -> Result<(), QuotaError> {
        let result = self.check(owner_id).await?;

        if !result.allowed {
            tracing::info!(
                user_id = %owner_id,
                current = result.current,
                limit = ?result.limit,
                "Task creation rejected by plan limit"
            );
            return Err(QuotaError::LimitExceeded {
                limit: result.limit.unwrap_or_default(),
                current: result.current,
            });
        }

        if let Some(remaining) = result.remaining() {
            tracing::debug!(user_id = %owner_id, remaining, "Plan limit checked");
        }

        Ok(())
    }
}
