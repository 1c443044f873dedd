//! Task model for the to-do and reminder list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Task priority stored under its Greek label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
pub enum TaskPriority {
    #[serde(rename = "Χαμηλή")]
    #[sqlx(rename = "Χαμηλή")]
    Low,
    #[default]
    #[serde(rename = "Μεσαία")]
    #[sqlx(rename = "Μεσαία")]
    Medium,
    #[serde(rename = "Υψηλή")]
    #[sqlx(rename = "Υψηλή")]
    High,
    #[serde(rename = "Επείγουσα")]
    #[sqlx(rename = "Επείγουσα")]
    Urgent,
}

/// Task progress stored under its Greek label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "Εκκρεμής")]
    #[sqlx(rename = "Εκκρεμής")]
    Pending,
    #[serde(rename = "Σε Εξέλιξη")]
    #[sqlx(rename = "Σε Εξέλιξη")]
    InProgress,
    #[serde(rename = "Ολοκληρωμένη")]
    #[sqlx(rename = "Ολοκληρωμένη")]
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Εκκρεμής",
            TaskStatus::InProgress => "Σε Εξέλιξη",
            TaskStatus::Done => "Ολοκληρωμένη",
        }
    }
}

pub const DEFAULT_TASK_CATEGORY: &str = "Γενικά";

/// An ad-hoc to-do item, independent of members.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub category: Option<String>,
    /// Free-text tag naming a related entity; not a foreign key.
    pub related_to: Option<String>,
    pub created_at: String,
    /// Set only when the task transitions into `Done`.
    pub completed_at: Option<String>,
}

/// Request body for creating a new task.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub related_to: Option<String>,
}

/// Request body for changing a task's status.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
}
