/// Statistics report over a window of tasks

use super::window::TimeRange;
use crate::models::task::{Task, TaskStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Response of `GET /ai/analytics/tasks`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub time_range: String,
    pub statistics: Statistics,
    pub distribution: Distribution,
    pub overdue_tasks: Vec<OverdueTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub in_progress_tasks: u64,
    pub todo_tasks: u64,
    pub overdue_tasks: u64,
    pub total_time_spent: f64,
    /// Percentage, two decimals
    pub completion_rate: f64,
    /// Total time over completed tasks, two decimals
    pub average_time_per_task: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub by_status: StatusBreakdown,
    /// Task counts keyed by English weekday name of creation
    pub by_day: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub completed: u64,
    pub in_progress: u64,
    pub todo: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueTask {
    pub id: Uuid,
    pub task_number: i64,
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub days_overdue: i64,
}

/// Rounds to `places` decimals, half away from zero
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Completed share of `total` as a percentage, 0 when empty
pub fn completion_rate(completed: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

/// Whole days past due, rounded up
pub fn days_overdue(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((now - due).num_milliseconds() as f64 / MILLIS_PER_DAY).ceil() as i64
}

/// Derives the report from tasks already filtered to the window
pub fn build_report(range: TimeRange, tasks: &[Task], now: DateTime<Utc>) -> AnalyticsReport {
    let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count() as u64;

    let total = tasks.len() as u64;
    let completed = count(TaskStatus::Completed);
    let in_progress = count(TaskStatus::InProgress);
    let todo = count(TaskStatus::Todo);
    let total_time: f64 = tasks.iter().map(|t| t.time_spent_minutes).sum();
    let average = if completed > 0 {
        total_time / completed as f64
    } else {
        0.0
    };

    let overdue: Vec<OverdueTask> = tasks
        .iter()
        .filter(|t| t.is_overdue(now))
        .filter_map(|t| {
            let due = t.due_date?;
            Some(OverdueTask {
                id: t.id,
                task_number: t.task_number,
                title: t.title.clone(),
                due_date: due,
                days_overdue: days_overdue(due, now),
            })
        })
        .collect();

    let mut by_day = BTreeMap::new();
    for task in tasks {
        *by_day
            .entry(task.created_at.format("%A").to_string())
            .or_insert(0) += 1;
    }

    AnalyticsReport {
        time_range: range.as_str().to_string(),
        statistics: Statistics {
            total_tasks: total,
            completed_tasks: completed,
            in_progress_tasks: in_progress,
            todo_tasks: todo,
            overdue_tasks: overdue.len() as u64,
            total_time_spent: total_time,
            completion_rate: round_to(completion_rate(completed, total), 2),
            average_time_per_task: round_to(average, 2),
        },
        distribution: Distribution {
            by_status: StatusBreakdown {
                completed,
                in_progress,
                todo,
            },
            by_day,
        },
        overdue_tasks: overdue,
    }
}
