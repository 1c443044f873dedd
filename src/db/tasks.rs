//! Task store: the lodge secretary's to-do and reminder list.

use chrono::{Duration, NaiveDate, Utc};

use super::Repository;
use crate::errors::AppError;
use crate::models::{CreateTaskRequest, Task, TaskStatus, DEFAULT_TASK_CATEGORY};

impl Repository {
    /// Create a new task.
    pub async fn create_task(&self, req: &CreateTaskRequest) -> Result<Task, AppError> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Task title is required".to_string()));
        }

        let category = req
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_TASK_CATEGORY);
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO tasks (title, description, due_date, priority, status, category, related_to, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(title)
        .bind(&req.description)
        .bind(req.due_date)
        .bind(req.priority)
        .bind(TaskStatus::Pending)
        .bind(category)
        .bind(&req.related_to)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!("Created task {}", id);

        self.get_task(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Task {} vanished after insert", id)))
    }

    /// Get a task by ID.
    pub async fn get_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE task_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    /// List tasks, optionally restricted to one status. Undated tasks sort last.
    pub async fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, AppError> {
        let tasks = match status {
            Some(status) => {
                sqlx::query_as::<_, Task>(
                    "SELECT * FROM tasks WHERE status = ? ORDER BY due_date IS NULL, due_date, task_id",
                )
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Task>(
                    "SELECT * FROM tasks ORDER BY due_date IS NULL, due_date, task_id",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(tasks)
    }

    /// Change a task's status.
    ///
    /// Entering `Done` stamps `completed_at`; a task already done keeps its
    /// stamp; any other status clears it.
    pub async fn update_task_status(&self, id: i64, status: TaskStatus) -> Result<Task, AppError> {
        let task = self
            .get_task(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Task {} not found", id)))?;

        let completed_at = match (task.status, status) {
            (TaskStatus::Done, TaskStatus::Done) => task.completed_at,
            (_, TaskStatus::Done) => Some(Utc::now().to_rfc3339()),
            _ => None,
        };

        sqlx::query("UPDATE tasks SET status = ?, completed_at = ? WHERE task_id = ?")
            .bind(status)
            .bind(&completed_at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        tracing::debug!("Task {} is now {}", id, status.as_str());

        Ok(Task {
            status,
            completed_at,
            ..task
        })
    }

    /// Delete a task.
    pub async fn delete_task(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE task_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Task {} not found", id)));
        }
        Ok(())
    }

    /// Open tasks due between `today` and `today + days`, inclusive.
    pub async fn upcoming_tasks(&self, today: NaiveDate, days: i64) -> Result<Vec<Task>, AppError> {
        let until = Duration::try_days(days.max(0))
            .and_then(|span| today.checked_add_signed(span))
            .ok_or_else(|| AppError::Validation(format!("Window of {} days is out of range", days)))?;
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE status != ? AND due_date IS NOT NULL AND due_date >= ? AND due_date <= ?
            ORDER BY due_date, task_id
            "#,
        )
        .bind(TaskStatus::Done)
        .bind(today)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    /// Open tasks whose due date has passed.
    pub async fn overdue_tasks(&self, today: NaiveDate) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE status != ? AND due_date IS NOT NULL AND due_date < ?
            ORDER BY due_date, task_id
            "#,
        )
        .bind(TaskStatus::Done)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }
}
