/// PostgreSQL storage backend
///
/// Row types mirror the table layout and are converted into domain models
/// after fetching. Status and plan columns are TEXT with CHECK constraints,
/// so a value outside the enums surfaces as [`StoreError::Corrupt`].
///
/// Partial task updates build their `SET` list dynamically, binding only
/// the supplied fields.

use super::{StoreError, TaskStore, UserStore};
use crate::models::task::{NewTask, Task, TaskChanges, TaskKey, TaskQuery, TaskStatus};
use crate::models::user::{normalize_email, CreateUser, PlanTier, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgPool};
use sqlx::query::QueryAs;
use sqlx::Postgres;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, name, plan, created_at, updated_at";

const TASK_COLUMNS: &str = "id, task_number, owner_id, title, description, due_date, status, \
                            time_spent_minutes, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: String,
    plan: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let plan = PlanTier::from_str(&row.plan)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown plan '{}'", row.plan)))?;
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            plan,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    task_number: i64,
    owner_id: Uuid,
    title: String,
    description: String,
    due_date: Option<DateTime<Utc>>,
    status: String,
    time_spent_minutes: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status = TaskStatus::from_str(&row.status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown status '{}'", row.status)))?;
        Ok(Task {
            id: row.id,
            task_number: row.task_number,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            status,
            time_spent_minutes: row.time_spent_minutes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn map_user(row: Option<UserRow>) -> Result<Option<User>, StoreError> {
    row.map(User::try_from).transpose()
}

fn map_task(row: Option<TaskRow>) -> Result<Option<Task>, StoreError> {
    row.map(Task::try_from).transpose()
}

/// WHERE fragment addressing a task by `$2`
fn key_clause(key: TaskKey) -> &'static str {
    match key {
        TaskKey::Id(_) => "id = $2",
        TaskKey::Number(_) => "task_number = $2",
    }
}

/// ORDER BY clause for a listing
///
/// Column and direction come from closed enums, never from input. NULL is
/// the smallest value in both directions and ties break on `task_number`
/// in the same direction, matching [`TaskQuery::sort`].
fn order_by_clause(query: &TaskQuery) -> String {
    format!(
        "ORDER BY {} {} {}, task_number {}",
        query.sort_by.column(),
        query.order.as_sql(),
        query.order.nulls_sql(),
        query.order.as_sql(),
    )
}

/// Increment statement for `time_spent_minutes`; `$3` is the minutes
fn add_time_sql(key: TaskKey) -> String {
    format!(
        "UPDATE tasks SET time_spent_minutes = time_spent_minutes + $3, updated_at = NOW() \
         WHERE owner_id = $1 AND {} RETURNING {TASK_COLUMNS}",
        key_clause(key)
    )
}

fn bind_key<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    key: TaskKey,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    match key {
        TaskKey::Id(id) => query.bind(id),
        TaskKey::Number(number) => query.bind(number),
    }
}

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }

    async fn create(&self, data: CreateUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, email, password_hash, name, plan) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(normalize_email(&data.email))
            .bind(data.password_hash)
            .bind(data.name)
            .bind(PlanTier::Free.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    StoreError::DuplicateEmail
                }
                other => StoreError::Database(other),
            })?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        map_user(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        map_user(row)
    }

    async fn update_name(&self, id: Uuid, name: &str) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "UPDATE users SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        map_user(row)
    }

    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "UPDATE users SET password_hash = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(password_hash)
            .fetch_optional(&self.pool)
            .await?;
        map_user(row)
    }

    async fn set_plan(&self, id: Uuid, plan: PlanTier) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "UPDATE users SET plan = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(plan.as_str())
            .fetch_optional(&self.pool)
            .await?;
        map_user(row)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert(
        &self,
        owner_id: Uuid,
        task_number: i64,
        data: NewTask,
    ) -> Result<Task, StoreError> {
        let sql = format!(
            "INSERT INTO tasks (id, task_number, owner_id, title, description, due_date, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {TASK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(task_number)
            .bind(owner_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.due_date)
            .bind(data.status.unwrap_or_default().as_str())
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn list(&self, owner_id: Uuid, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = $1");
        if query.status.is_some() {
            sql.push_str(" AND status = $2");
        }
        sql.push(' ');
        sql.push_str(&order_by_clause(query));
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut q = sqlx::query_as::<_, TaskRow>(&sql).bind(owner_id);
        if let Some(status) = query.status {
            q = q.bind(status.as_str());
        }

        q.fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Task::try_from)
            .collect()
    }

    async fn list_created_between(
        &self,
        owner_id: Uuid,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE owner_id = $1 AND created_at >= $2 \
             AND ($3::timestamptz IS NULL OR created_at <= $3) \
             ORDER BY created_at ASC, task_number ASC"
        );
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(owner_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Task::try_from)
            .collect()
    }

    async fn count(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn find(&self, owner_id: Uuid, key: TaskKey) -> Result<Option<Task>, StoreError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = $1 AND {}",
            key_clause(key)
        );
        let q = sqlx::query_as::<_, TaskRow>(&sql).bind(owner_id);
        let row = bind_key(q, key).fetch_optional(&self.pool).await?;
        map_task(row)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        key: TaskKey,
        changes: &TaskChanges,
    ) -> Result<Option<Task>, StoreError> {
        // $1 = owner, $2 = key, fields start at $3
        let mut sql = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if changes.title.is_some() {
            bind_count += 1;
            sql.push_str(&format!(", title = ${bind_count}"));
        }
        if changes.description.is_some() {
            bind_count += 1;
            sql.push_str(&format!(", description = ${bind_count}"));
        }
        if changes.due_date.is_some() {
            bind_count += 1;
            sql.push_str(&format!(", due_date = ${bind_count}"));
        }
        if changes.status.is_some() {
            bind_count += 1;
            sql.push_str(&format!(", status = ${bind_count}"));
        }

        sql.push_str(&format!(
            " WHERE owner_id = $1 AND {} RETURNING {TASK_COLUMNS}",
            key_clause(key)
        ));

        let mut q = bind_key(sqlx::query_as::<_, TaskRow>(&sql).bind(owner_id), key);
        if let Some(title) = &changes.title {
            q = q.bind(title.clone());
        }
        if let Some(description) = &changes.description {
            q = q.bind(description.clone());
        }
        if let Some(due_date) = changes.due_date {
            q = q.bind(due_date);
        }
        if let Some(status) = changes.status {
            q = q.bind(status.as_str());
        }

        let row = q.fetch_optional(&self.pool).await?;
        map_task(row)
    }

    async fn delete(&self, owner_id: Uuid, key: TaskKey) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM tasks WHERE owner_id = $1 AND {}", key_clause(key));
        let q = sqlx::query(&sql).bind(owner_id);
        let q = match key {
            TaskKey::Id(id) => q.bind(id),
            TaskKey::Number(number) => q.bind(number),
        };
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_time(
        &self,
        owner_id: Uuid,
        key: TaskKey,
        minutes: f64,
    ) -> Result<Option<Task>, StoreError> {
        // Single-statement increment; concurrent calls never lose an update.
        let sql = add_time_sql(key);
        let q = bind_key(sqlx::query_as::<_, TaskRow>(&sql).bind(owner_id), key);
        let row = q.bind(minutes).fetch_optional(&self.pool).await?;
        map_task(row)
    }
}
