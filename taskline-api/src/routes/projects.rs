/// Project endpoints
///
/// # Endpoints
///
/// - `GET /api/projects` - The caller's projects, filtered and paginated
/// - `POST /api/projects` - Create a project owned by the caller
/// - `GET /api/projects/:id` - Fetch one of the caller's projects
/// - `PUT /api/projects/:id` - Update one of the caller's projects
/// - `DELETE /api/projects/:id` - Delete one of the caller's projects
/// - `GET /api/projects/:id/stats` - Per-status task counts
///
/// Every operation is scoped to the caller's own projects; someone
/// else's project is indistinguishable from a missing one (404).

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use taskline_shared::auth::identity::CurrentUser;
use taskline_shared::models::project::{NewProject, Project, ProjectFilter, UpdateProject};
use taskline_shared::models::task::{PriorityStats, Task, TaskStats};
use taskline_shared::query::{DateRange, Page};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{current_db_user, page_params},
};

/// Query parameters for the project list
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListQuery {
    pub name: Option<String>,
    pub created_from: Option<NaiveDateTime>,
    pub created_to: Option<NaiveDateTime>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
}

/// Create project request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub description: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,
}

/// Update project request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,
}

/// Lists the caller's projects.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Query(query): Query<ProjectListQuery>,
) -> ApiResult<Json<Page<Project>>> {
    let user = current_db_user(&state, &identity).await?;

    let filter = ProjectFilter {
        name: query.name,
        created: DateRange::new(
            query.created_from.map(|t| t.and_utc()),
            query.created_to.map(|t| t.and_utc()),
        ),
    };
    let params = page_params(query.page, query.size, query.sort_by, query.direction);

    let page = Project::search(&state.db, user.id, &filter, &params).await?;
    Ok(Json(page))
}

/// Creates a project owned by the caller.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;

    let user = current_db_user(&state, &identity).await?;

    let project = Project::create(
        &state.db,
        user.id,
        NewProject {
            name: req.name,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
        },
    )
    .await?;

    Ok(Json(project))
}

/// Fetches one of the caller's projects.
pub async fn get_project(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let user = current_db_user(&state, &identity).await?;

    let project = Project::find_for_owner(&state.db, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}

/// Updates one of the caller's projects.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;

    let user = current_db_user(&state, &identity).await?;

    let project = Project::update_for_owner(
        &state.db,
        id,
        user.id,
        UpdateProject {
            name: req.name,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}

/// Deletes one of the caller's projects.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = current_db_user(&state, &identity).await?;

    let deleted = Project::delete_for_owner(&state.db, id, user.id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Project deleted" })))
}

/// Task statistics for one of the caller's projects
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatsResponse {
    /// Counts by workflow status
    pub tasks: TaskStats,

    /// Counts by priority
    pub priorities: PriorityStats,

    /// Share of tasks completed, 0-100
    pub completion_percentage: f64,
}

/// Task counts and completion rate for one of the caller's projects.
pub async fn project_stats(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectStatsResponse>> {
    let user = current_db_user(&state, &identity).await?;

    // Ownership gate before touching task data
    Project::find_for_owner(&state.db, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let tasks = Task::stats_for_project(&state.db, id).await?;
    let priorities = Task::priority_stats_for_project(&state.db, id).await?;
    let completion_percentage = tasks.completion_percentage();

    Ok(Json(ProjectStatsResponse {
        tasks,
        priorities,
        completion_percentage,
    }))
}
