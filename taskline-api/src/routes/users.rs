/// User management endpoints (admin only)
///
/// # Endpoints
///
/// - `GET /api/users` - Filtered, paginated user list
/// - `GET /api/users/:id` - Fetch one user
/// - `PUT /api/users/:id` - Update name, email, role, or password
/// - `DELETE /api/users/:id` - Remove a user

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use taskline_shared::auth::password;
use taskline_shared::models::user::{Role, UpdateUser, User, UserFilter};
use taskline_shared::query::{DateRange, Page};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::page_params,
};

/// Query parameters for the user list
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub created_from: Option<NaiveDateTime>,
    pub created_to: Option<NaiveDateTime>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
}

/// Update user request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub role: Option<Role>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

/// Lists users with filtering and pagination.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<Page<User>>> {
    let filter = UserFilter {
        name: query.name,
        email: query.email,
        role: query.role,
        created: DateRange::new(
            query.created_from.map(|t| t.and_utc()),
            query.created_to.map(|t| t.and_utc()),
        ),
    };
    let params = page_params(query.page, query.size, query.sort_by, query.direction);

    let page = User::search(&state.db, &filter, &params).await?;
    Ok(Json(page))
}

/// Fetches a single user.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Updates a user's profile, role, or password.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;

    let password_hash = match req.password {
        Some(ref plain) => Some(
            password::hash_password(plain)
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
        ),
        None => None,
    };

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: req.role,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Deletes a user.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = User::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}
