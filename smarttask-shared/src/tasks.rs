/// Task lifecycle service
///
/// Orchestrates creation (plan gate, then sequence allocation, then insert)
/// and the owner-scoped read/update/delete/time-logging operations.
/// Identifiers arrive as raw path segments and are dispatched with
/// [`TaskKey::parse`]; anything that cannot address a task, or addresses
/// someone else's task, is reported as [`TaskError::NotFound`].
///
/// # Example
///
/// ```
/// use smarttask_shared::models::task::NewTask;
/// use smarttask_shared::models::user::CreateUser;
/// use smarttask_shared::quota::QuotaLimits;
/// use smarttask_shared::store::Stores;
/// use smarttask_shared::tasks::TaskService;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stores = Stores::in_memory();
/// let user = stores.users.create(CreateUser {
///     email: "dev@example.com".into(),
///     password_hash: "hash".into(),
///     name: "Dev".into(),
/// }).await?;
///
/// let service = TaskService::new(&stores, QuotaLimits::default());
/// let task = service.create(user.id, NewTask { title: "Ship it".into(), ..Default::default() }).await?;
/// let same = service.get(user.id, &task.task_number.to_string()).await?;
/// assert_eq!(task.id, same.id);
/// # Ok(())
/// # }
/// ```

use crate::models::task::{NewTask, Task, TaskChanges, TaskKey, TaskQuery};
use crate::quota::{PlanGate, QuotaError, QuotaLimits};
use crate::sequence::SequenceAllocator;
use crate::store::{StoreError, Stores, TaskStore};
use std::sync::Arc;
use uuid::Uuid;

/// Task operation errors
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Rejected input, nothing was written
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Missing, or owned by another user
    #[error("Task not found")]
    NotFound,

    /// Plan gate rejection or lookup failure
    #[error(transparent)]
    Quota(#[from] QuotaError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TaskError {
    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        TaskError::Validation {
            field,
            message: message.into(),
        }
    }
}

fn normalized_title(title: &str) -> Result<String, TaskError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::validation("title", "Title is required"));
    }
    Ok(title.to_string())
}

fn resolve(identifier: &str) -> Result<TaskKey, TaskError> {
    TaskKey::parse(identifier).ok_or(TaskError::NotFound)
}

/// Owner-scoped task operations
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    sequence: Arc<dyn SequenceAllocator>,
    gate: PlanGate,
}

impl TaskService {
    pub fn new(stores: &Stores, limits: QuotaLimits) -> Self {
        Self {
            tasks: stores.tasks.clone(),
            sequence: stores.sequence.clone(),
            gate: PlanGate::new(stores.users.clone(), stores.tasks.clone(), limits),
        }
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.tasks
    }

    /// Creates a task for `owner_id`
    ///
    /// # Errors
    ///
    /// - `TaskError::Validation` if the title is blank
    /// - `TaskError::Quota` if the owner's plan ceiling is reached; no
    ///   sequence number is consumed in that case
    pub async fn create(&self, owner_id: Uuid, mut data: NewTask) -> Result<Task, TaskError> {
        data.title = normalized_title(&data.title)?;

        self.gate.enforce(owner_id).await?;

        let task_number = self.sequence.next_value().await?;
        let task = self.tasks.insert(owner_id, task_number, data).await?;

        tracing::info!(
            user_id = %owner_id,
            task_id = %task.id,
            task_number = task.task_number,
            "Task created"
        );
        Ok(task)
    }

    pub async fn list(&self, owner_id: Uuid, query: &TaskQuery) -> Result<Vec<Task>, TaskError> {
        Ok(self.tasks.list(owner_id, query).await?)
    }

    /// Fetches by UUID or, for all-digit identifiers, by sequence number
    pub async fn get(&self, owner_id: Uuid, identifier: &str) -> Result<Task, TaskError> {
        let key = resolve(identifier)?;
        self.tasks
            .find(owner_id, key)
            .await?
            .ok_or(TaskError::NotFound)
    }

    /// Applies a partial update
    ///
    /// The sequence number, owner and time spent are never touched here.
    pub async fn update(
        &self,
        owner_id: Uuid,
        identifier: &str,
        mut changes: TaskChanges,
    ) -> Result<Task, TaskError> {
        if let Some(title) = changes.title.take() {
            changes.title = Some(normalized_title(&title)?);
        }
        let key = resolve(identifier)?;

        if changes.is_empty() {
            return self.tasks.find(owner_id, key).await?.ok_or(TaskError::NotFound);
        }

        let task = self
            .tasks
            .update(owner_id, key, &changes)
            .await?
            .ok_or(TaskError::NotFound)?;

        tracing::info!(user_id = %owner_id, task_number = task.task_number, "Task updated");
        Ok(task)
    }

    pub async fn delete(&self, owner_id: Uuid, identifier: &str) -> Result<(), TaskError> {
        let key = resolve(identifier)?;
        if !self.tasks.delete(owner_id, key).await? {
            return Err(TaskError::NotFound);
        }

        tracing::info!(user_id = %owner_id, identifier, "Task deleted");
        Ok(())
    }

    /// Adds `minutes` to the task's time spent as an atomic increment
    ///
    /// # Errors
    ///
    /// `TaskError::Validation` unless `minutes` is a finite positive number.
    pub async fn log_time(
        &self,
        owner_id: Uuid,
        identifier: &str,
        minutes: f64,
    ) -> Result<Task, TaskError> {
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(TaskError::validation(
                "minutes",
                "minutes must be a positive number",
            ));
        }
        let key = resolve(identifier)?;

        self.tasks
            .add_time(owner_id, key, minutes)
            .await?
            .ok_or(TaskError::NotFound)
    }
}
