/// Task endpoints
///
/// # Endpoints
///
/// - `GET /api/projects/:id/tasks` - A project's tasks, filtered and paginated
/// - `POST /api/projects/:id/tasks` - Create a task in the caller's project
/// - `GET /api/tasks/:id` - Fetch a task
/// - `PUT /api/tasks/:id` - Update a task
/// - `DELETE /api/tasks/:id` - Delete a task
/// - `PUT /api/tasks/:id/status` - Move a task through the workflow
/// - `PUT /api/tasks/:id/assign` - Assign or unassign a task

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use taskline_shared::auth::identity::CurrentUser;
use taskline_shared::models::project::Project;
use taskline_shared::models::task::{
    NewTask, Task, TaskFilter, TaskPriority, TaskStatus, UpdateTask,
};
use taskline_shared::query::{DateRange, Page};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{current_db_user, page_params},
};

/// Query parameters for a project's task list
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub created_from: Option<NaiveDateTime>,
    pub created_to: Option<NaiveDateTime>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    pub description: Option<String>,

    /// Defaults to PENDING
    pub status: Option<TaskStatus>,

    /// Defaults to MEDIUM
    pub priority: Option<TaskPriority>,

    pub assignee_id: Option<Uuid>,

    pub due_date: Option<NaiveDate>,
}

/// Update task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub assignee_id: Option<Uuid>,

    pub due_date: Option<NaiveDate>,
}

/// Status change request
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TaskStatus,
}

/// Assignment request; `null` unassigns
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub user_id: Option<Uuid>,
}

/// Lists a project's tasks.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Page<Task>>> {
    let user = current_db_user(&state, &identity).await?;

    Project::find_for_owner(&state.db, project_id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let filter = TaskFilter {
        title: query.title,
        status: query.status,
        priority: query.priority,
        assignee_id: query.assignee_id,
        created: DateRange::new(
            query.created_from.map(|t| t.and_utc()),
            query.created_to.map(|t| t.and_utc()),
        ),
    };
    let params = page_params(query.page, query.size, query.sort_by, query.direction);

    let page = Task::search(&state.db, project_id, &filter, &params).await?;
    Ok(Json(page))
}

/// Creates a task in the caller's project.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let user = current_db_user(&state, &identity).await?;

    Project::find_for_owner(&state.db, project_id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let task = Task::create(
        &state.db,
        project_id,
        NewTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee_id: req.assignee_id,
            due_date: req.due_date,
        },
    )
    .await?;

    Ok(Json(task))
}

/// Fetches a task.
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Updates a task.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let task = Task::update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee_id: req.assignee_id,
            due_date: req.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Deletes a task.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = Task::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Task deleted" })))
}

/// Moves a task to a new status.
pub async fn update_task_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Json<Task>> {
    let task = Task::update_status(&state.db, id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Assigns a task to a user, or unassigns it.
pub async fn assign_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<Task>> {
    if let Some(user_id) = req.user_id {
        taskline_shared::models::user::User::find_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Assignee not found".to_string()))?;
    }

    let task = Task::assign(&state.db, id, req.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}
