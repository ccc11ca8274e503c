/// Dashboard and reporting endpoints
///
/// # Endpoints
///
/// - `GET /api/dashboard/overview` - The caller's task counts and logged time
/// - `GET /api/dashboard/my-tasks` - The caller's assigned tasks, due-soonest first
/// - `GET /api/reports/project/:id` - Project report for managers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taskline_shared::auth::identity::CurrentUser;
use taskline_shared::models::project::Project;
use taskline_shared::models::task::{AssignedTaskFilter, Task, TaskPriority, TaskStats, TaskStatus};
use taskline_shared::models::time_log::{TimeLog, UserMinutes};
use taskline_shared::query::Page;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{current_db_user, page_params},
};

/// Overview of the caller's workload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    /// Assigned task counts by status
    pub tasks: TaskStats,

    /// Assigned tasks past their due date and not completed
    pub overdue_tasks: i64,

    /// Total minutes the caller has logged
    pub total_minutes_logged: i64,
}

/// Query parameters for the my-tasks list
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MyTasksQuery {
    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    /// Lower due-date bound; applies on its own
    pub due_from: Option<NaiveDate>,

    /// Upper due-date bound; applies on its own
    pub due_to: Option<NaiveDate>,

    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
}

/// Project report for managers
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReportResponse {
    pub project: Project,

    /// Task counts by status
    pub tasks: TaskStats,

    /// Total minutes logged against the project's tasks
    pub total_minutes_logged: i64,

    /// Minutes logged per user, highest first
    pub minutes_by_user: Vec<UserMinutes>,
}

/// The caller's workload at a glance.
pub async fn overview(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
) -> ApiResult<Json<OverviewResponse>> {
    let user = current_db_user(&state, &identity).await?;

    let tasks = Task::stats_for_assignee(&state.db, user.id).await?;
    let overdue_tasks = Task::count_overdue_for_assignee(&state.db, user.id).await?;
    let total_minutes_logged = TimeLog::total_minutes_for_user(&state.db, user.id).await?;

    Ok(Json(OverviewResponse {
        tasks,
        overdue_tasks,
        total_minutes_logged,
    }))
}

/// The caller's assigned tasks, due-soonest first by default.
pub async fn my_tasks(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Query(query): Query<MyTasksQuery>,
) -> ApiResult<Json<Page<Task>>> {
    let user = current_db_user(&state, &identity).await?;

    let filter = AssignedTaskFilter {
        status: query.status,
        priority: query.priority,
        due_from: query.due_from,
        due_to: query.due_to,
    };
    let params = page_params(query.page, query.size, query.sort_by, query.direction);

    let page = Task::search_assigned(&state.db, user.id, &filter, &params).await?;
    Ok(Json(page))
}

/// Full report for one of the caller's projects.
pub async fn project_report(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectReportResponse>> {
    let user = current_db_user(&state, &identity).await?;

    let project = Project::find_for_owner(&state.db, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let tasks = Task::stats_for_project(&state.db, id).await?;
    let total_minutes_logged = TimeLog::total_minutes_for_project(&state.db, id).await?;
    let minutes_by_user = TimeLog::minutes_by_user_for_project(&state.db, id).await?;

    Ok(Json(ProjectReportResponse {
        project,
        tasks,
        total_minutes_logged,
        minutes_by_user,
    }))
}
