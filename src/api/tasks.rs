//! Task API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Local;
use serde::Deserialize;

use super::{success, ApiResult};
use crate::models::{CreateTaskRequest, Task, TaskStatus, UpdateTaskStatusRequest};
use crate::AppState;

const DEFAULT_UPCOMING_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    #[serde(default)]
    pub days: Option<i64>,
}

/// GET /api/tasks - List tasks, optionally by status.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Vec<Task>> {
    success(state.repo.list_tasks(query.status).await?)
}

/// POST /api/tasks - Create a task.
pub async fn create_task(
    State(state): State<AppState>,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<Task> {
    success(state.repo.create_task(&request).await?)
}

/// GET /api/tasks/upcoming - Open tasks due in the next `days` days.
pub async fn upcoming_tasks(
    State(state): State<AppState>,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Vec<Task>> {
    let days = query.days.unwrap_or(DEFAULT_UPCOMING_DAYS);
    let today = Local::now().date_naive();
    success(state.repo.upcoming_tasks(today, days).await?)
}

/// GET /api/tasks/overdue - Open tasks past their due date.
pub async fn overdue_tasks(State(state): State<AppState>) -> ApiResult<Vec<Task>> {
    let today = Local::now().date_naive();
    success(state.repo.overdue_tasks(today).await?)
}

/// PUT /api/tasks/{id}/status - Change a task's status.
pub async fn update_task_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateTaskStatusRequest>,
) -> ApiResult<Task> {
    success(state.repo.update_task_status(id, request.status).await?)
}

/// DELETE /api/tasks/{id} - Delete a task.
pub async fn delete_task(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.repo.delete_task(id).await?;
    success(())
}
