/// Prompts and fallback content for the AI analytics endpoints
///
/// Nothing here talks to a provider. The engine calls in with either the
/// model's text or the reason it has none, and always gets back a complete
/// response body.

use super::report::{completion_rate, round_to};
use crate::models::task::{Task, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Response of `GET /ai/summary/monthly`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub summary: String,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub achievements: Vec<String>,
    pub statistics: SummaryStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStatistics {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub total_time_spent: f64,
    /// Percentage, one decimal
    pub completion_rate: f64,
    /// e.g. `October 2026`; absent on the "no tasks" report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
}

impl SummaryStatistics {
    pub fn from_tasks(tasks: &[Task], month_label: impl Into<String>) -> Self {
        let total = tasks.len() as u64;
        let completed = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count() as u64;

        Self {
            total_tasks: total,
            completed_tasks: completed,
            total_time_spent: tasks.iter().map(|t| t.time_spent_minutes).sum(),
            completion_rate: round_to(completion_rate(completed, total), 1),
            month: Some(month_label.into()),
        }
    }
}

/// Response of `GET /ai/insights/productivity`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductivityInsights {
    pub insights: Vec<String>,
    pub trends: BTreeMap<String, serde_json::Value>,
    pub recommendations: Vec<String>,
}

/// Response of `POST /ai/chat/query`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAnswer {
    pub response: String,
    pub relevant_tasks: Option<serde_json::Value>,
    pub statistics: Option<serde_json::Value>,
}

impl ChatAnswer {
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            relevant_tasks: None,
            statistics: None,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Per-task fields handed to the model
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptTask<'a> {
    id: Uuid,
    task_number: i64,
    title: &'a str,
    description: &'a str,
    status: TaskStatus,
    time_spent_minutes: f64,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Task> for PromptTask<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            id: task.id,
            task_number: task.task_number,
            title: &task.title,
            description: &task.description,
            status: task.status,
            time_spent_minutes: task.time_spent_minutes,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

fn task_data(tasks: &[Task]) -> String {
    let rows: Vec<PromptTask<'_>> = tasks.iter().map(PromptTask::from).collect();
    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

pub fn no_tasks_summary() -> MonthlySummary {
    MonthlySummary {
        summary: "No tasks found. Start creating tasks to get AI-generated insights about your productivity!".into(),
        insights: strings(&["Create your first task to begin tracking your productivity"]),
        recommendations: strings(&["Add some tasks to your task manager to get started"]),
        achievements: Vec::new(),
        statistics: SummaryStatistics {
            total_tasks: 0,
            completed_tasks: 0,
            total_time_spent: 0.0,
            completion_rate: 0.0,
            month: None,
        },
    }
}

pub fn monthly_summary_prompt(tasks: &[Task], stats: &SummaryStatistics) -> String {
    let month = stats.month.as_deref().unwrap_or("the selected period");
    format!(
        r#"You are an AI assistant helping a user analyze their task management data for the month of {month}.

User's Task Data:
{data}

Statistics:
- Total Tasks: {total}
- Completed Tasks: {completed}
- Completion Rate: {rate}%
- Total Time Spent: {time} minutes

Please generate a comprehensive monthly summary including:
1. Overall productivity assessment
2. Key achievements and accomplishments
3. Areas for improvement
4. Insights on task completion patterns
5. Recommendations for next month

Format your response as a JSON object with this exact structure:
{{
  "summary": "Your comprehensive monthly summary paragraph",
  "insights": ["insight1", "insight2", "insight3"],
  "recommendations": ["recommendation1", "recommendation2", "recommendation3"],
  "achievements": ["achievement1", "achievement2", "achievement3"]
}}"#,
        data = task_data(tasks),
        total = stats.total_tasks,
        completed = stats.completed_tasks,
        rate = stats.completion_rate,
        time = stats.total_time_spent,
    )
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    summary: String,
    #[serde(default)]
    insights: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    achievements: Vec<String>,
}

/// Strips a surrounding Markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Turns model output into a summary
///
/// Structured JSON is used as-is. Anything else becomes the summary text,
/// paired with generic lists.
pub fn parse_monthly_summary(output: &str, statistics: SummaryStatistics) -> MonthlySummary {
    match serde_json::from_str::<SummaryBody>(strip_code_fence(output)) {
        Ok(body) => MonthlySummary {
            summary: body.summary,
            insights: body.insights,
            recommendations: body.recommendations,
            achievements: body.achievements,
            statistics,
        },
        Err(_) => MonthlySummary {
            summary: output.trim().to_string(),
            insights: strings(&[
                "Review your task completion patterns",
                "Focus on time management",
                "Set realistic goals",
            ]),
            recommendations: strings(&[
                "Break down large tasks into smaller ones",
                "Set specific deadlines",
                "Track your progress regularly",
            ]),
            achievements: strings(&[
                "Completed tasks this month",
                "Maintained task tracking",
                "Showed commitment to productivity",
            ]),
            statistics,
        },
    }
}

/// Summary built from the numbers alone, used when the provider fails
pub fn statistical_summary(tasks: &[Task], statistics: SummaryStatistics, now: DateTime<Utc>) -> MonthlySummary {
    let month = statistics.month.clone().unwrap_or_else(|| "this period".into());
    let overdue = tasks.iter().filter(|t| t.is_overdue(now)).count();

    let mut insights = vec![format!(
        "{} of {} tasks completed ({}%).",
        statistics.completed_tasks, statistics.total_tasks, statistics.completion_rate
    )];
    insights.push(format!(
        "{} minutes of work logged.",
        statistics.total_time_spent
    ));
    if overdue > 0 {
        insights.push(format!("{} tasks are past their due date.", overdue));
    }

    let mut recommendations = Vec::new();
    if overdue > 0 {
        recommendations.push("Reschedule or finish overdue tasks first".to_string());
    }
    recommendations.push("Break down large tasks into smaller ones".to_string());
    recommendations.push("Track your progress regularly".to_string());

    let achievements = if statistics.completed_tasks > 0 {
        vec![format!("Completed {} tasks", statistics.completed_tasks)]
    } else {
        Vec::new()
    };

    MonthlySummary {
        summary: format!(
            "In {} you worked on {} tasks and completed {} of them ({}%), logging {} minutes in total.",
            month,
            statistics.total_tasks,
            statistics.completed_tasks,
            statistics.completion_rate,
            statistics.total_time_spent
        ),
        insights,
        recommendations,
        achievements,
        statistics,
    }
}

pub fn no_tasks_insights() -> ProductivityInsights {
    ProductivityInsights {
        insights: strings(&["No tasks found for the selected time period."]),
        trends: BTreeMap::new(),
        recommendations: strings(&["Start creating tasks to track your productivity!"]),
    }
}

pub fn insights_prompt(tasks: &[Task], range_label: &str) -> String {
    format!(
        r#"Analyze the following task data for productivity insights over the last {range_label}:

Task Data:
{data}

Provide insights on:
1. Productivity patterns and trends
2. Time management efficiency
3. Task completion patterns
4. Areas for improvement

Respond in a conversational, helpful tone. Format your response with clear sections and bullet points. Use line breaks to separate different insights. Structure it like this:

**Productivity Patterns:**
• Insight 1
• Insight 2

**Time Management:**
• Insight 1
• Insight 2

**Recommendations:**
• Recommendation 1
• Recommendation 2"#,
        data = task_data(tasks),
    )
}

/// Model output is returned verbatim as a single insight
pub fn insights_from_text(text: String) -> ProductivityInsights {
    ProductivityInsights {
        insights: vec![text],
        trends: BTreeMap::new(),
        recommendations: Vec::new(),
    }
}

pub fn statistical_insights(tasks: &[Task], range_label: &str, now: DateTime<Utc>) -> ProductivityInsights {
    let total = tasks.len() as u64;
    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count() as u64;
    let minutes: f64 = tasks.iter().map(|t| t.time_spent_minutes).sum();
    let overdue = tasks.iter().filter(|t| t.is_overdue(now)).count();

    let mut insights = vec![
        format!(
            "You created {} tasks over the last {} and completed {} ({}%).",
            total,
            range_label,
            completed,
            round_to(completion_rate(completed, total), 1)
        ),
        format!("You logged {} minutes of work.", minutes),
    ];
    if overdue > 0 {
        insights.push(format!("{} tasks are overdue.", overdue));
    }

    ProductivityInsights {
        insights,
        trends: BTreeMap::new(),
        recommendations: strings(&[
            "Set specific deadlines",
            "Track your progress regularly",
        ]),
    }
}

pub fn no_tasks_answer() -> ChatAnswer {
    ChatAnswer::text(
        "I don't see any tasks in your account yet. Start by creating some tasks to get insights about your productivity!",
    )
}

pub fn chat_prompt(tasks: &[Task], query: &str, now: DateTime<Utc>) -> String {
    format!(
        r#"You are an AI assistant helping a user analyze their task management data.
Answer the following question based on their task data: "{query}"

User's Task Data:
{data}

Instructions:
1. Analyze the task data to answer the user's question
2. Provide specific, data-driven insights
3. If the question asks for specific tasks, include relevant task details
4. Be helpful and actionable in your response
5. If you need to calculate time periods, use the current date as reference: {now}
6. Respond in a conversational, friendly tone
7. Include specific numbers and data when relevant
8. Do NOT return JSON format - just provide a natural text response

Provide a clear, helpful answer to the user's question."#,
        data = task_data(tasks),
        now = now.to_rfc3339(),
    )
}

pub fn degraded_answer(tasks: &[Task]) -> ChatAnswer {
    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count();
    ChatAnswer::text(format!(
        "I can't reach the assistant right now. Of your {} most recent tasks, {} are completed. Please try again in a moment.",
        tasks.len(),
        completed
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: TaskStatus, minutes: f64) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            task_number: 7,
            owner_id: Uuid::nil(),
            title: "Write report".into(),
            description: "quarterly".into(),
            due_date: None,
            status,
            time_spent_minutes: minutes,
            created_at: now,
            updated_at: now,
        }
    }

    fn stats() -> SummaryStatistics {
        SummaryStatistics::from_tasks(
            &[task(TaskStatus::Completed, 20.0), task(TaskStatus::Todo, 5.0), task(TaskStatus::Todo, 0.0)],
            "October 2026",
        )
    }

    #[test]
    fn test_summary_statistics() {
        let stats = stats();
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.total_time_spent, 25.0);
        assert_eq!(stats.completion_rate, 33.3);
        assert_eq!(stats.month.as_deref(), Some("October 2026"));
    }

    #[test]
    fn test_parse_structured_output() {
        let output = r#"{"summary":"Good month","insights":["a"],"recommendations":["b"],"achievements":["c"]}"#;
        let summary = parse_monthly_summary(output, stats());
        assert_eq!(summary.summary, "Good month");
        assert_eq!(summary.insights, vec!["a"]);
        assert_eq!(summary.achievements, vec!["c"]);
    }

    #[test]
    fn test_parse_fenced_output() {
        let output = "```json\n{\"summary\":\"Fenced\",\"insights\":[]}\n```";
        let summary = parse_monthly_summary(output, stats());
        assert_eq!(summary.summary, "Fenced");
        assert!(summary.recommendations.is_empty());
    }

    #[test]
    fn test_parse_plain_text_output() {
        let summary = parse_monthly_summary("You did great.", stats());
        assert_eq!(summary.summary, "You did great.");
        assert_eq!(summary.insights.len(), 3);
        assert_eq!(summary.recommendations[0], "Break down large tasks into smaller ones");
        assert_eq!(summary.achievements[2], "Showed commitment to productivity");
        assert_eq!(summary.statistics.total_tasks, 3);
    }

    #[test]
    fn test_no_tasks_summary_has_no_month() {
        let json = serde_json::to_value(no_tasks_summary()).unwrap();
        assert_eq!(json["statistics"]["totalTasks"], 0);
        assert!(json["statistics"].get("month").is_none());
        assert_eq!(json["achievements"], serde_json::json!([]));
    }

    #[test]
    fn test_statistical_summary_mentions_numbers() {
        let tasks = vec![task(TaskStatus::Completed, 20.0)];
        let stats = SummaryStatistics::from_tasks(&tasks, "October 2026");
        let summary = statistical_summary(&tasks, stats, Utc::now());
        assert!(summary.summary.contains("October 2026"));
        assert!(summary.summary.contains("100%"));
        assert_eq!(summary.achievements, vec!["Completed 1 tasks"]);
    }

    #[test]
    fn test_prompts_embed_task_data() {
        let tasks = vec![task(TaskStatus::InProgress, 12.0)];
        let prompt = chat_prompt(&tasks, "what's left?", Utc::now());
        assert!(prompt.contains("\"what's left?\""));
        assert!(prompt.contains("\"taskNumber\": 7"));
        assert!(prompt.contains("\"status\": \"in_progress\""));

        let prompt = insights_prompt(&tasks, "week");
        assert!(prompt.contains("over the last week"));
    }

    #[test]
    fn test_chat_answer_nulls() {
        let json = serde_json::to_value(no_tasks_answer()).unwrap();
        assert!(json["relevantTasks"].is_null());
        assert!(json["statistics"].is_null());
    }

    #[test]
    fn test_insights_shapes() {
        let json = serde_json::to_value(insights_from_text("text".into())).unwrap();
        assert_eq!(json["insights"], serde_json::json!(["text"]));
        assert_eq!(json["trends"], serde_json::json!({}));
        assert_eq!(json["recommendations"], serde_json::json!([]));
    }
}
