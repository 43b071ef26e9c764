/// In-memory storage backend
///
/// Holds users and tasks in `tokio::sync::RwLock`-guarded maps. Every
/// mutation happens under the write lock, which gives the same atomicity
/// the SQL backend gets from single-statement updates. Ordering and
/// filtering reuse the model helpers so both backends answer queries
/// identically.

use super::{StoreError, TaskStore, UserStore};
use crate::models::task::{NewTask, Task, TaskChanges, TaskKey, TaskQuery};
use crate::models::user::{normalize_email, CreateUser, PlanTier, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed task, bypassing sequence allocation.
    ///
    /// Lets tests place tasks at arbitrary creation times.
    pub async fn seed_task(&self, task: Task) {
        self.tasks.write().await.insert(task.id, task);
    }

    async fn modify_user<F>(&self, id: Uuid, f: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id)?;
        f(user);
        user.updated_at = Utc::now();
        Some(user.clone())
    }

    async fn modify_task<F>(&self, owner_id: Uuid, key: TaskKey, f: F) -> Option<Task>
    where
        F: FnOnce(&mut Task),
    {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .values_mut()
            .find(|t| t.owner_id == owner_id && key.matches(t))?;
        f(task);
        task.updated_at = Utc::now();
        Some(task.clone())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create(&self, data: CreateUser) -> Result<User, StoreError> {
        let email = normalize_email(&data.email);
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash: data.password_hash,
            name: data.name,
            plan: PlanTier::Free,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_name(&self, id: Uuid, name: &str) -> Result<Option<User>, StoreError> {
        Ok(self.modify_user(id, |u| u.name = name.to_string()).await)
    }

    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .modify_user(id, |u| u.password_hash = password_hash.to_string())
            .await)
    }

    async fn set_plan(&self, id: Uuid, plan: PlanTier) -> Result<Option<User>, StoreError> {
        Ok(self.modify_user(id, |u| u.plan = plan).await)
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn insert(
        &self,
        owner_id: Uuid,
        task_number: i64,
        data: NewTask,
    ) -> Result<Task, StoreError> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            task_number,
            owner_id,
            title: data.title,
            description: data.description,
            due_date: data.due_date,
            status: data.status.unwrap_or_default(),
            time_spent_minutes: 0.0,
            created_at: now,
            updated_at: now,
        };

        let mut tasks = self.tasks.write().await;
        if tasks.values().any(|t| t.task_number == task_number) {
            return Err(StoreError::Corrupt(format!(
                "task number {task_number} already assigned"
            )));
        }
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn list(&self, owner_id: Uuid, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.owner_id == owner_id)
            .filter(|t| query.status.map_or(true, |s| t.status == s))
            .cloned()
            .collect();

        query.sort(&mut tasks);
        if let Some(limit) = query.limit {
            tasks.truncate(limit);
        }
        Ok(tasks)
    }

    async fn list_created_between(
        &self,
        owner_id: Uuid,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| {
                t.owner_id == owner_id
                    && t.created_at >= start
                    && end.map_or(true, |end| t.created_at <= end)
            })
            .cloned()
            .collect();

        tasks.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.task_number.cmp(&b.task_number))
        });
        Ok(tasks)
    }

    async fn count(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.values().filter(|t| t.owner_id == owner_id).count() as u64)
    }

    async fn find(&self, owner_id: Uuid, key: TaskKey) -> Result<Option<Task>, StoreError> {
        Ok(self
            .tasks
            .read()
            .await
            .values()
            .find(|t| t.owner_id == owner_id && key.matches(t))
            .cloned())
    }

    async fn update(
        &self,
        owner_id: Uuid,
        key: TaskKey,
        changes: &TaskChanges,
    ) -> Result<Option<Task>, StoreError> {
        Ok(self
            .modify_task(owner_id, key, |t| changes.apply_to(t))
            .await)
    }

    async fn delete(&self, owner_id: Uuid, key: TaskKey) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.write().await;
        let id = tasks
            .values()
            .find(|t| t.owner_id == owner_id && key.matches(t))
            .map(|t| t.id);
        Ok(id.and_then(|id| tasks.remove(&id)).is_some())
    }

    async fn add_time(
        &self,
        owner_id: Uuid,
        key: TaskKey,
        minutes: f64,
    ) -> Result<Option<Task>, StoreError> {
        Ok(self
            .modify_task(owner_id, key, |t| t.time_spent_minutes += minutes)
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: String::new(),
        }
    }

    #[tokio::test]
    async fn test_email_is_unique_case_insensitively() {
        let store = InMemoryStore::new();
        let user = store.create(new_user(" Ann@Example.com")).await.unwrap();
        assert_eq!(user.email, "ann@example.com");

        let dup = store.create(new_user("ANN@example.COM")).await;
        assert!(matches!(dup, Err(StoreError::DuplicateEmail)));

        let found = store.find_by_email("ann@EXAMPLE.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_task_operations_are_owner_scoped() {
        let store = InMemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let task = store
            .insert(
                alice,
                1,
                NewTask {
                    title: "write report".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(store.find(bob, TaskKey::Id(task.id)).await.unwrap().is_none());
        assert!(store.find(bob, TaskKey::Number(1)).await.unwrap().is_none());
        assert!(store.add_time(bob, TaskKey::Number(1), 5.0).await.unwrap().is_none());
        assert!(!store.delete(bob, TaskKey::Id(task.id)).await.unwrap());
        assert_eq!(store.count(bob).await.unwrap(), 0);

        assert_eq!(store.count(alice).await.unwrap(), 1);
        assert!(store.delete(alice, TaskKey::Number(1)).await.unwrap());
        assert_eq!(store.count(alice).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_task_number_is_rejected() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        store.insert(owner, 7, NewTask::default()).await.unwrap();
        let second = store.insert(Uuid::new_v4(), 7, NewTask::default()).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_set_plan_and_missing_user() {
        let store = InMemoryStore::new();
        let user = store.create(new_user("p@example.com")).await.unwrap();

        let upgraded = store.set_plan(user.id, PlanTier::Premium).await.unwrap();
        assert_eq!(upgraded.map(|u| u.plan), Some(PlanTier::Premium));

        let missing = store.set_plan(Uuid::new_v4(), PlanTier::Premium).await.unwrap();
        assert!(missing.is_none());
    }
}
