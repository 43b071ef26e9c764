/// Storage traits and backends
///
/// Handlers and services only see the [`UserStore`], [`TaskStore`] and
/// [`SequenceAllocator`] traits. Two backends implement them:
///
/// - [`postgres::PgStore`]: production backend on a `sqlx` pool
/// - [`memory::InMemoryStore`]: process-local backend used by tests and
///   `DATABASE_URL=memory://`
///
/// Every task operation takes the owner's ID and filters on it, so a task
/// owned by someone else looks exactly like a missing one.
///
/// # Example
///
/// ```
/// use smarttask_shared::store::Stores;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stores = Stores::in_memory();
/// stores.ping().await?;
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use crate::models::task::{NewTask, Task, TaskChanges, TaskKey, TaskQuery};
use crate::models::user::{CreateUser, PlanTier, User};
use crate::sequence::{InMemorySequence, PgSequenceAllocator, SequenceAllocator};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Errors raised by storage backends
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An account with this email already exists
    #[error("Email already registered")]
    DuplicateEmail,

    /// A row could not be mapped back into a model
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Account persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Cheap liveness probe used by the health endpoint
    async fn ping(&self) -> Result<(), StoreError>;

    /// Inserts a new account, failing with [`StoreError::DuplicateEmail`]
    /// when the normalized email is taken
    async fn create(&self, data: CreateUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Case-insensitive lookup
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn update_name(&self, id: Uuid, name: &str) -> Result<Option<User>, StoreError>;

    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError>;

    async fn set_plan(&self, id: Uuid, plan: PlanTier) -> Result<Option<User>, StoreError>;
}

/// Owner-scoped task persistence
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a task under an already allocated sequence number
    async fn insert(
        &self,
        owner_id: Uuid,
        task_number: i64,
        data: NewTask,
    ) -> Result<Task, StoreError>;

    async fn list(&self, owner_id: Uuid, query: &TaskQuery) -> Result<Vec<Task>, StoreError>;

    /// Tasks created at or after `start` and, when given, at or before
    /// `end`; oldest first
    async fn list_created_between(
        &self,
        owner_id: Uuid,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Task>, StoreError>;

    async fn count(&self, owner_id: Uuid) -> Result<u64, StoreError>;

    async fn find(&self, owner_id: Uuid, key: TaskKey) -> Result<Option<Task>, StoreError>;

    /// Writes only the supplied fields; `Ok(None)` when no owned task matches
    async fn update(
        &self,
        owner_id: Uuid,
        key: TaskKey,
        changes: &TaskChanges,
    ) -> Result<Option<Task>, StoreError>;

    /// Returns whether a task was removed
    async fn delete(&self, owner_id: Uuid, key: TaskKey) -> Result<bool, StoreError>;

    /// Atomically adds `minutes` to `time_spent_minutes`
    async fn add_time(
        &self,
        owner_id: Uuid,
        key: TaskKey,
        minutes: f64,
    ) -> Result<Option<Task>, StoreError>;
}

/// The set of storage handles the services run against
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub sequence: Arc<dyn SequenceAllocator>,
}

impl Stores {
    /// PostgreSQL-backed stores sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(postgres::PgStore::new(pool.clone()));
        Self {
            users: store.clone(),
            tasks: store,
            sequence: Arc::new(PgSequenceAllocator::new(pool)),
        }
    }

    /// Fresh, empty in-memory stores
    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(memory::InMemoryStore::new()))
    }

    /// Wraps an existing in-memory store, so tests can keep a handle for seeding
    pub fn from_memory(store: Arc<memory::InMemoryStore>) -> Self {
        Self {
            users: store.clone(),
            tasks: store,
            sequence: Arc::new(InMemorySequence::new()),
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.users.ping().await
    }
}
