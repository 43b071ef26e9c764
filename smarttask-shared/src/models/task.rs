/// Task model and query types
///
/// Tasks are owned by exactly one user and addressed either by their opaque
/// UUID or by their globally unique `task_number`. The number is allocated
/// once at creation and never changes; `time_spent_minutes` only grows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     task_number BIGINT NOT NULL UNIQUE,
///     owner_id UUID NOT NULL REFERENCES users (id),
///     title TEXT NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     due_date TIMESTAMPTZ,
///     status TEXT NOT NULL DEFAULT 'todo',
///     time_spent_minutes DOUBLE PRECISION NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Parses status from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(TaskStatus::Todo),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

/// A user's task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque store-assigned ID
    pub id: Uuid,

    /// Human-readable sequence number, unique across all users
    pub task_number: i64,

    /// Owning user
    #[serde(rename = "userId")]
    pub owner_id: Uuid,

    pub title: String,

    pub description: String,

    pub due_date: Option<DateTime<Utc>>,

    pub status: TaskStatus,

    /// Accumulated minutes, only ever incremented
    pub time_spent_minutes: f64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether the task is past due and not completed at `now`
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => due < now && self.status != TaskStatus::Completed,
            None => false,
        }
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    /// Defaults to [`TaskStatus::Todo`]
    pub status: Option<TaskStatus>,
}

/// Partial update of a task
///
/// Only `Some` fields are written. `due_date: Some(None)` clears the date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub status: Option<TaskStatus>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
    }

    /// Applies the changes to an in-memory copy
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

/// How a caller addresses a task
///
/// The API accepts one path segment for both forms: an all-digit string is
/// a sequence number, anything else must be a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKey {
    Id(Uuid),
    Number(i64),
}

impl TaskKey {
    /// Dispatches on the identifier's shape
    ///
    /// Returns `None` when the identifier can address no task at all
    /// (not a UUID, or digits that overflow `i64`).
    ///
    /// # Example
    ///
    /// ```
    /// use smarttask_shared::models::task::TaskKey;
    ///
    /// assert_eq!(TaskKey::parse("42"), Some(TaskKey::Number(42)));
    /// assert!(matches!(
    ///     TaskKey::parse("67e55044-10b1-426f-9247-bb680e5fe0c8"),
    ///     Some(TaskKey::Id(_))
    /// ));
    /// assert_eq!(TaskKey::parse("not-a-task"), None);
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            return raw.parse::<i64>().ok().map(TaskKey::Number);
        }
        Uuid::parse_str(raw).ok().map(TaskKey::Id)
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskKey::Id(id) => task.id == *id,
            TaskKey::Number(n) => task.task_number == *n,
        }
    }
}

/// Sortable task fields
///
/// Anything outside this allow-list falls back to `CreatedAt`, so raw
/// client input never reaches an ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    DueDate,
    TimeSpentMinutes,
    Title,
    Status,
}

impl SortField {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "dueDate" => SortField::DueDate,
            "timeSpentMinutes" => SortField::TimeSpentMinutes,
            "title" => SortField::Title,
            "status" => SortField::Status,
            _ => SortField::CreatedAt,
        }
    }

    /// Column expression used in ORDER BY
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::DueDate => "due_date",
            SortField::TimeSpentMinutes => "time_spent_minutes",
            SortField::Title => "title COLLATE \"C\"",
            SortField::Status => "status COLLATE \"C\"",
        }
    }

    /// Ascending comparison matching the SQL ordering
    ///
    /// Missing due dates sort before present ones.
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::DueDate => a.due_date.cmp(&b.due_date),
            SortField::TimeSpentMinutes => a
                .time_spent_minutes
                .partial_cmp(&b.time_spent_minutes)
                .unwrap_or(Ordering::Equal),
            SortField::Title => a.title.as_bytes().cmp(b.title.as_bytes()),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        }
    }
}

/// Sort direction, descending unless `asc` is asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Null placement that keeps NULL the smallest value in both directions
    pub fn nulls_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "NULLS FIRST",
            SortOrder::Desc => "NULLS LAST",
        }
    }
}

/// Listing parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub sort_by: SortField,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl TaskQuery {
    /// Orders `tasks` in place the same way the SQL backend does
    pub fn sort(&self, tasks: &mut [Task]) {
        tasks.sort_by(|a, b| {
            let ord = self
                .sort_by
                .compare(a, b)
                .then_with(|| a.task_number.cmp(&b.task_number));
            match self.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }
}

/// Parses a due date as sent by clients
///
/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` timestamps
/// (taken as UTC) and bare `YYYY-MM-DD` dates (midnight UTC).
///
/// # Example
///
/// ```
/// use smarttask_shared::models::task::parse_due_date;
///
/// let due = parse_due_date("2025-01-01").unwrap();
/// assert_eq!(due.to_rfc3339(), "2025-01-01T00:00:00+00:00");
/// assert!(parse_due_date("next tuesday").is_none());
/// ```
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn task(number: i64, title: &str, due: Option<DateTime<Utc>>) -> Task {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        Task {
            id: Uuid::new_v4(),
            task_number: number,
            owner_id: Uuid::nil(),
            title: title.to_string(),
            description: String::new(),
            due_date: due,
            status: TaskStatus::Todo,
            time_spent_minutes: 0.0,
            created_at: now + Duration::minutes(number),
            updated_at: now,
        }
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).unwrap(),
            "in_progress"
        );
        assert_eq!(TaskStatus::from_str("done"), None);
    }

    #[test]
    fn test_task_key_dispatch() {
        assert_eq!(TaskKey::parse("007"), Some(TaskKey::Number(7)));
        assert_eq!(TaskKey::parse(""), None);
        assert_eq!(TaskKey::parse("12a"), None);
        assert_eq!(TaskKey::parse("99999999999999999999999"), None);

        let id = Uuid::new_v4();
        assert_eq!(TaskKey::parse(&id.to_string()), Some(TaskKey::Id(id)));
    }

    #[test]
    fn test_sort_field_falls_back_to_created_at() {
        assert_eq!(SortField::parse("title"), SortField::Title);
        assert_eq!(SortField::parse("title; DROP TABLE tasks"), SortField::CreatedAt);
        assert_eq!(SortField::parse("owner_id"), SortField::CreatedAt);
        assert_eq!(SortOrder::parse("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Desc);
    }

    #[test]
    fn test_due_date_sort_puts_missing_dates_first_ascending() {
        let day = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let mut tasks = vec![
            task(1, "a", Some(day + Duration::days(2))),
            task(2, "b", None),
            task(3, "c", Some(day)),
        ];

        let query = TaskQuery {
            sort_by: SortField::DueDate,
            order: SortOrder::Asc,
            ..Default::default()
        };
        query.sort(&mut tasks);
        let numbers: Vec<i64> = tasks.iter().map(|t| t.task_number).collect();
        assert_eq!(numbers, vec![2, 3, 1]);

        let query = TaskQuery {
            order: SortOrder::Desc,
            ..query
        };
        query.sort(&mut tasks);
        let numbers: Vec<i64> = tasks.iter().map(|t| t.task_number).collect();
        assert_eq!(numbers, vec![1, 3, 2]);
    }

    #[test]
    fn test_title_sort_is_bytewise() {
        let mut tasks = vec![task(1, "banana", None), task(2, "Zebra", None), task(3, "apple", None)];
        TaskQuery {
            sort_by: SortField::Title,
            order: SortOrder::Asc,
            ..Default::default()
        }
        .sort(&mut tasks);
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Zebra", "apple", "banana"]);
    }

    #[test]
    fn test_changes_clear_due_date() {
        let mut t = task(1, "x", Some(Utc::now()));
        let changes = TaskChanges {
            due_date: Some(None),
            ..Default::default()
        };
        assert!(!changes.is_empty());
        changes.apply_to(&mut t);
        assert!(t.due_date.is_none());
        assert_eq!(t.title, "x");
    }

    #[test]
    fn test_overdue_excludes_completed() {
        let now = Utc::now();
        let mut t = task(1, "x", Some(now - Duration::hours(1)));
        assert!(t.is_overdue(now));
        t.status = TaskStatus::Completed;
        assert!(!t.is_overdue(now));
        t.due_date = None;
        assert!(!t.is_overdue(now));
    }

    #[test]
    fn test_parse_due_date_variants() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_due_date("2025-01-01"), Some(expected));
        assert_eq!(parse_due_date("2025-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_due_date("2025-01-01T02:00:00+02:00"), Some(expected));
        assert_eq!(parse_due_date("2025-01-01T00:00:00.000"), Some(expected));
        assert_eq!(parse_due_date("01/01/2025"), None);
    }

    #[test]
    fn test_task_json_is_camel_case() {
        let t = task(5, "x", None);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["taskNumber"], 5);
        assert!(json.get("userId").is_some());
        assert!(json["dueDate"].is_null());
        assert_eq!(json["status"], "todo");
        assert_eq!(json["timeSpentMinutes"], 0.0);
    }
}
