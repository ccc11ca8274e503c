/// Time log endpoints
///
/// # Endpoints
///
/// - `GET /api/tasks/:id/timelogs` - A task's time logs, filtered and paginated
/// - `POST /api/tasks/:id/timelogs` - Log time against a task as the caller
/// - `PUT /api/timelogs/:id` - Edit the caller's own time log
/// - `DELETE /api/timelogs/:id` - Remove a time log (admin)

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use taskline_shared::auth::identity::CurrentUser;
use taskline_shared::models::task::Task;
use taskline_shared::models::time_log::{NewTimeLog, TimeLog, TimeLogFilter, UpdateTimeLog};
use taskline_shared::query::Page;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{current_db_user, page_params},
};

/// Query parameters for the time log list
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimeLogListQuery {
    pub user_id: Option<Uuid>,

    /// Lower bound on start time; applies on its own
    pub start_from: Option<NaiveDateTime>,

    /// Upper bound on start time; applies on its own
    pub start_to: Option<NaiveDateTime>,

    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
}

/// Create time log request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimeLogRequest {
    pub start_time: NaiveDateTime,

    pub end_time: Option<NaiveDateTime>,

    #[validate(range(min = 1, message = "Duration must be at least 1 minute"))]
    pub duration_minutes: Option<i32>,

    pub description: Option<String>,
}

/// Update time log request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTimeLogRequest {
    pub start_time: Option<NaiveDateTime>,

    pub end_time: Option<NaiveDateTime>,

    #[validate(range(min = 1, message = "Duration must be at least 1 minute"))]
    pub duration_minutes: Option<i32>,

    pub description: Option<String>,
}

/// Lists a task's time logs.
pub async fn list_time_logs(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Query(query): Query<TimeLogListQuery>,
) -> ApiResult<Json<Page<TimeLog>>> {
    Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let filter = TimeLogFilter {
        user_id: query.user_id,
        start_from: query.start_from.map(|t| t.and_utc()),
        start_to: query.start_to.map(|t| t.and_utc()),
    };
    let params = page_params(query.page, query.size, query.sort_by, query.direction);

    let page = TimeLog::search(&state.db, task_id, &filter, &params).await?;
    Ok(Json(page))
}

/// Logs time against a task as the caller.
pub async fn create_time_log(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CreateTimeLogRequest>,
) -> ApiResult<Json<TimeLog>> {
    req.validate()?;

    let user = current_db_user(&state, &identity).await?;

    Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let log = TimeLog::create(
        &state.db,
        task_id,
        user.id,
        NewTimeLog {
            start_time: req.start_time.and_utc(),
            end_time: req.end_time.map(|t| t.and_utc()),
            duration_minutes: req.duration_minutes,
            description: req.description,
        },
    )
    .await?;

    Ok(Json(log))
}

/// Edits the caller's own time log.
///
/// A log written by someone else is reported as missing.
pub async fn update_time_log(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTimeLogRequest>,
) -> ApiResult<Json<TimeLog>> {
    req.validate()?;

    let user = current_db_user(&state, &identity).await?;

    let log = TimeLog::update_for_user(
        &state.db,
        id,
        user.id,
        UpdateTimeLog {
            start_time: req.start_time.map(|t| t.and_utc()),
            end_time: req.end_time.map(|t| t.and_utc()),
            duration_minutes: req.duration_minutes,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Time log not found".to_string()))?;

    Ok(Json(log))
}

/// Removes a time log.
pub async fn delete_time_log(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = TimeLog::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Time log not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Time log deleted" })))
}
