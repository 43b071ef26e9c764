/// Analytics over a user's tasks
///
/// [`AnalyticsEngine`] serves four read-only views, all scoped to one owner:
///
/// - `compute_statistics`: counts, rates, overdue set and weekday
///   distribution for a [`TimeRange`]
/// - `monthly_summary`: model-written narrative for a calendar month
/// - `productivity_insights`: model-written trend notes for a [`TimeRange`]
/// - `chat_query`: free-text question over the 50 most recent tasks
///
/// The three model-backed views never fail because of the provider. Each
/// call is bounded by the engine's timeout; on timeout, provider error or
/// missing configuration the engine logs a warning and answers with content
/// built from the statistics instead.
///
/// # Example
///
/// ```
/// use smarttask_shared::ai::UnavailableGenerator;
/// use smarttask_shared::analytics::{AnalyticsEngine, TimeRange};
/// use smarttask_shared::store::Stores;
/// use std::{sync::Arc, time::Duration};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stores = Stores::in_memory();
/// let engine = AnalyticsEngine::new(
///     stores.tasks.clone(),
///     Arc::new(UnavailableGenerator),
///     Duration::from_secs(20),
/// );
///
/// let report = engine
///     .compute_statistics(uuid::Uuid::new_v4(), TimeRange::Week, chrono::Utc::now())
///     .await?;
/// assert_eq!(report.statistics.total_tasks, 0);
/// # Ok(())
/// # }
/// ```

pub mod report;
pub mod summary;
pub mod window;

pub use report::AnalyticsReport;
pub use summary::{ChatAnswer, MonthlySummary, ProductivityInsights};
pub use window::{CalendarMonth, TimeRange};

use crate::ai::{GenerationError, TextGenerator};
use crate::models::task::{SortField, SortOrder, TaskQuery};
use crate::store::{StoreError, TaskStore};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// How many recent tasks a chat question sees
pub const CHAT_CONTEXT_TASKS: usize = 50;

/// Lookback used when the requested month has no tasks
pub const FALLBACK_LOOKBACK_DAYS: i64 = 30;

#[derive(Clone)]
pub struct AnalyticsEngine {
    tasks: Arc<dyn TaskStore>,
    generator: Arc<dyn TextGenerator>,
    timeout: std::time::Duration,
}

impl AnalyticsEngine {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        generator: Arc<dyn TextGenerator>,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            tasks,
            generator,
            timeout,
        }
    }

    /// Runs one bounded completion
    async fn complete(&self, owner_id: Uuid, purpose: &str, prompt: String) -> Result<String, GenerationError> {
        let result = match tokio::time::timeout(self.timeout, self.generator.generate(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::timeout(self.timeout)),
        };

        if let Err(err) = &result {
            tracing::warn!(
                user_id = %owner_id,
                provider = self.generator.name(),
                purpose,
                error = %err,
                "Text generation failed, using fallback content"
            );
        }
        result
    }

    /// Statistics for tasks created since the window start
    pub async fn compute_statistics(
        &self,
        owner_id: Uuid,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsReport, StoreError> {
        let tasks = self
            .tasks
            .list_created_between(owner_id, range.window_start(now), None)
            .await?;

        Ok(report::build_report(range, &tasks, now))
    }

    /// Narrative summary of one calendar month
    ///
    /// `month` is `YYYY-MM` or a date inside the month; absent or
    /// unparseable values select the month containing `now`. When the month
    /// has no tasks, the trailing 30 days are used instead (the label still
    /// names the requested month). When those are empty too, the fixed
    /// "no tasks" report is returned without calling the provider.
    pub async fn monthly_summary(
        &self,
        owner_id: Uuid,
        month: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<MonthlySummary, StoreError> {
        let target = month
            .and_then(CalendarMonth::parse)
            .unwrap_or_else(|| CalendarMonth::containing(now));

        let mut tasks = match target.bounds() {
            Some((start, end)) => {
                self.tasks
                    .list_created_between(owner_id, start, Some(end))
                    .await?
            }
            None => Vec::new(),
        };

        if tasks.is_empty() {
            let since = now - Duration::days(FALLBACK_LOOKBACK_DAYS);
            tasks = self.tasks.list_created_between(owner_id, since, None).await?;
        }

        if tasks.is_empty() {
            return Ok(summary::no_tasks_summary());
        }

        let statistics = summary::SummaryStatistics::from_tasks(&tasks, target.label());
        let prompt = summary::monthly_summary_prompt(&tasks, &statistics);

        Ok(match self.complete(owner_id, "monthly_summary", prompt).await {
            Ok(text) => summary::parse_monthly_summary(&text, statistics),
            Err(_) => summary::statistical_summary(&tasks, statistics, now),
        })
    }

    pub async fn productivity_insights(
        &self,
        owner_id: Uuid,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<ProductivityInsights, StoreError> {
        let tasks = self
            .tasks
            .list_created_between(owner_id, range.window_start(now), None)
            .await?;

        if tasks.is_empty() {
            return Ok(summary::no_tasks_insights());
        }

        let prompt = summary::insights_prompt(&tasks, range.as_str());
        Ok(match self.complete(owner_id, "productivity_insights", prompt).await {
            Ok(text) => summary::insights_from_text(text),
            Err(_) => summary::statistical_insights(&tasks, range.as_str(), now),
        })
    }

    /// Answers `query` using the owner's most recent tasks as context
    pub async fn chat_query(
        &self,
        owner_id: Uuid,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<ChatAnswer, StoreError> {
        let recent = TaskQuery {
            status: None,
            sort_by: SortField::CreatedAt,
            order: SortOrder::Desc,
            limit: Some(CHAT_CONTEXT_TASKS),
        };
        let tasks = self.tasks.list(owner_id, &recent).await?;

        if tasks.is_empty() {
            return Ok(summary::no_tasks_answer());
        }

        let prompt = summary::chat_prompt(&tasks, query, now);
        Ok(match self.complete(owner_id, "chat_query", prompt).await {
            Ok(text) => ChatAnswer::text(text),
            Err(_) => summary::degraded_answer(&tasks),
        })
    }
}
