/// Comment endpoints
///
/// # Endpoints
///
/// - `GET /api/tasks/:id/comments` - A task's comments, paginated
/// - `POST /api/tasks/:id/comments` - Add a comment as the caller
/// - `PUT /api/comments/:id` - Edit the caller's own comment
/// - `DELETE /api/comments/:id` - Remove a comment (admin)

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use taskline_shared::auth::identity::CurrentUser;
use taskline_shared::models::comment::Comment;
use taskline_shared::models::task::Task;
use taskline_shared::query::Page;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{current_db_user, page_params},
};

/// Query parameters for the comment list
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommentListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
}

/// Comment body
#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 4000, message = "Content must be 1-4000 characters"))]
    pub content: String,
}

/// Lists a task's comments.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Query(query): Query<CommentListQuery>,
) -> ApiResult<Json<Page<Comment>>> {
    Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let params = page_params(query.page, query.size, query.sort_by, query.direction);

    let page = Comment::list_for_task(&state.db, task_id, &params).await?;
    Ok(Json(page))
}

/// Adds a comment to a task as the caller.
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<Json<Comment>> {
    req.validate()?;

    let user = current_db_user(&state, &identity).await?;

    Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let comment = Comment::create(&state.db, task_id, user.id, req.content).await?;
    Ok(Json(comment))
}

/// Edits the caller's own comment.
///
/// A comment written by someone else is reported as missing, the same
/// as one that never existed.
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<Json<Comment>> {
    req.validate()?;

    let user = current_db_user(&state, &identity).await?;

    let comment = Comment::update_for_author(&state.db, id, user.id, req.content)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    Ok(Json(comment))
}

/// Removes a comment.
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = Comment::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Comment deleted" })))
}
