/// Analytics and assistant endpoints
///
/// - `GET  /api/ai/analytics/tasks?timeRange=week|month|year` (default `month`)
/// - `GET  /api/ai/summary/monthly?month=YYYY-MM` (default current month)
/// - `GET  /api/ai/insights/productivity?timeRange=...` (default `week`)
/// - `POST /api/ai/chat/query` with `{ "query": "..." }`
///
/// Model-backed endpoints always answer 200; provider trouble degrades to
/// statistics-based content.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use smarttask_shared::{
    analytics::{AnalyticsReport, ChatAnswer, MonthlySummary, ProductivityInsights, TimeRange},
    auth::middleware::AuthContext,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeParams {
    pub time_range: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthParams {
    pub month: Option<String>,
}

pub async fn task_analytics(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<AnalyticsReport>> {
    let range = TimeRange::parse_or(params.time_range.as_deref(), TimeRange::Month);
    let report = state
        .analytics
        .compute_statistics(auth.user_id, range, Utc::now())
        .await?;
    Ok(Json(report))
}

pub async fn monthly_summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<MonthParams>,
) -> ApiResult<Json<MonthlySummary>> {
    let summary = state
        .analytics
        .monthly_summary(auth.user_id, params.month.as_deref(), Utc::now())
        .await?;
    Ok(Json(summary))
}

pub async fn productivity_insights(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<ProductivityInsights>> {
    let range = TimeRange::parse_or(params.time_range.as_deref(), TimeRange::Week);
    let insights = state
        .analytics
        .productivity_insights(auth.user_id, range, Utc::now())
        .await?;
    Ok(Json(insights))
}

/// Free-text question about the caller's tasks
///
/// # Errors
///
/// - `400 Bad Request`: `query` missing, blank or not a string
pub async fn chat_query(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<ChatAnswer>> {
    let Json(body) = payload?;
    let query = body
        .get("query")
        .and_then(Value::as_str)
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest("Query is required and must be a string".to_string())
        })?;

    let answer = state
        .analytics
        .chat_query(auth.user_id, query, Utc::now())
        .await?;
    Ok(Json(answer))
}
