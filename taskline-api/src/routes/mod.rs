/// API route handlers
///
/// One module per resource:
///
/// - `health`: liveness probe
/// - `auth`: register, login, refresh, logout
/// - `users`: admin-only user management
/// - `projects`: project CRUD and stats
/// - `tasks`: task CRUD, status, assignment
/// - `comments`, `timelogs`, `attachments`: task sub-resources
/// - `dashboard`: per-user overview, my-tasks, project reports

pub mod attachments;
pub mod auth;
pub mod comments;
pub mod dashboard;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod timelogs;
pub mod users;

use taskline_shared::auth::identity::CurrentUser;
use taskline_shared::models::user::User;
use taskline_shared::query::PageParams;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Loads the full user row behind the request identity.
///
/// The token only carries email and role; handlers that need the user's
/// ID resolve it here. A token whose account has since been deleted is
/// treated as unauthenticated.
pub(crate) async fn current_db_user(state: &AppState, identity: &CurrentUser) -> ApiResult<User> {
    User::find_by_email(&state.db, &identity.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))
}

/// Assembles pagination parameters from the raw query fields.
pub(crate) fn page_params(
    page: Option<i64>,
    size: Option<i64>,
    sort_by: Option<String>,
    direction: Option<String>,
) -> PageParams {
    PageParams {
        page,
        size,
        sort_by,
        direction,
    }
}
