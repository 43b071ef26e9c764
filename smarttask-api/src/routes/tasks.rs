/// Task endpoints
///
/// All routes are scoped to the authenticated user. `:id` is either the
/// task's UUID or, when all digits, its task number; a task that belongs to
/// someone else is reported exactly like a missing one.
///
/// Every invalid field of a request body is reported at once, as
/// `details` on a 400 response.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use smarttask_shared::{
    auth::middleware::AuthContext,
    models::task::{
        parse_due_date, NewTask, SortField, SortOrder, Task, TaskChanges, TaskQuery, TaskStatus,
    },
};
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn title_required(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(invalid("required", "Title is required"));
    }
    Ok(())
}

fn title_not_blank(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(invalid("blank", "title must be a non-empty string"));
    }
    Ok(())
}

/// Blank clears the date, anything else must parse
fn due_date_string(raw: &str) -> Result<(), ValidationError> {
    if raw.trim().is_empty() || parse_due_date(raw).is_some() {
        return Ok(());
    }
    Err(invalid("date", "dueDate must be a valid date string"))
}

fn known_status(raw: &str) -> Result<(), ValidationError> {
    match TaskStatus::from_str(raw) {
        Some(_) => Ok(()),
        None => Err(invalid(
            "status",
            "status must be one of todo, in_progress, completed",
        )),
    }
}

/// Keeps an explicit `null` apart from an absent field
fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// `None` for absent, `Some(None)` for `null` or a blank string
fn resolve_due_date(raw: Option<Option<String>>) -> Option<Option<DateTime<Utc>>> {
    raw.map(|value| {
        value
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| parse_due_date(&s))
    })
}

/// Create task request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(
        required(message = "Title is required"),
        custom(function = "title_required")
    )]
    pub title: Option<String>,

    pub description: Option<String>,

    #[serde(rename = "dueDate", default, deserialize_with = "nullable")]
    #[validate(custom(function = "due_date_string"))]
    pub due_date: Option<Option<String>>,

    #[validate(custom(function = "known_status"))]
    pub status: Option<String>,
}

impl CreateTaskRequest {
    /// Call after `validate()`
    pub fn into_new_task(self) -> NewTask {
        NewTask {
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            due_date: resolve_due_date(self.due_date).flatten(),
            status: self.status.as_deref().and_then(TaskStatus::from_str),
        }
    }
}

/// Partial update request; absent fields are left alone
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(custom(function = "title_not_blank"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[serde(rename = "dueDate", default, deserialize_with = "nullable")]
    #[validate(custom(function = "due_date_string"))]
    pub due_date: Option<Option<String>>,

    #[validate(custom(function = "known_status"))]
    pub status: Option<String>,
}

impl UpdateTaskRequest {
    /// Call after `validate()`
    pub fn into_changes(self) -> TaskChanges {
        TaskChanges {
            title: self.title,
            description: self.description,
            due_date: resolve_due_date(self.due_date),
            status: self.status.as_deref().and_then(TaskStatus::from_str),
        }
    }
}

/// Listing query string
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

/// Create a task
///
/// ```text
/// POST /api/tasks
/// { "title": "Write report", "dueDate": "2025-01-01", "status": "todo" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `403 Forbidden`: free plan task limit reached
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(req) = payload?;
    req.validate()?;

    let task = state.tasks.create(auth.user_id, req.into_new_task()).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// List own tasks
///
/// `status` filters (an unknown value matches nothing), `sortBy` is one of
/// `createdAt`, `dueDate`, `timeSpentMinutes`, `title`, `status` (default
/// `createdAt`), `order` is `asc` or anything else for descending.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Task>>> {
    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => match TaskStatus::from_str(raw) {
            Some(status) => Some(status),
            None => return Ok(Json(Vec::new())),
        },
    };

    let query = TaskQuery {
        status,
        sort_by: params
            .sort_by
            .as_deref()
            .map(SortField::parse)
            .unwrap_or_default(),
        order: params
            .order
            .as_deref()
            .map(SortOrder::parse)
            .unwrap_or_default(),
        limit: None,
    };

    Ok(Json(state.tasks.list(auth.user_id, &query).await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.tasks.get(auth.user_id, &id).await?))
}

/// Partial update; `"dueDate": null` clears the due date
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let Json(req) = payload?;
    req.validate()?;

    Ok(Json(state.tasks.update(auth.user_id, &id, req.into_changes()).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.tasks.delete(auth.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add minutes to a task
///
/// ```text
/// POST /api/tasks/42/time
/// { "minutes": 25 }
/// ```
pub async fn log_time(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let Json(body) = payload?;
    let minutes = body
        .get("minutes")
        .and_then(Value::as_f64)
        .ok_or_else(|| ApiError::validation("minutes", "minutes must be a positive number"))?;

    Ok(Json(state.tasks.log_time(auth.user_id, &id, minutes).await?))
}
