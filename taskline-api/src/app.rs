/// Application state and router builder
///
/// The router nests every resource under `/api` and runs a single
/// policy middleware in front of all of it: the route's access rule is
/// looked up in the shared policy table, the bearer token (when
/// required) is validated, and the caller's identity is placed in the
/// request extensions for handlers to read.

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use taskline_shared::auth::identity::{bearer_token, CurrentUser};
use taskline_shared::auth::jwt::TokenKind;
use taskline_shared::auth::policy::{authorize, route_access, Access, Denial};
use taskline_shared::auth::refresh_store::InMemoryRefreshTokenStore;
use taskline_shared::auth::service::AuthService;
use taskline_shared::models::user::PgUserStore;

use crate::{config::Config, error::ApiError, routes};

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; Arc keeps the
/// clones cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Auth orchestration (token issuance, refresh registry)
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Creates application state with the default auth wiring: a
    /// Postgres user store and the process-local refresh registry.
    pub fn new(db: PgPool, config: Config) -> Self {
        let codec = taskline_shared::auth::jwt::TokenCodec::new(&config.jwt.secret);
        let auth = AuthService::new(
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(InMemoryRefreshTokenStore::new()),
            codec,
        );

        Self {
            db,
            config: Arc::new(config),
            auth: Arc::new(auth),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── /health                           # Liveness (public)
/// └── /api/
///     ├── /auth/        register, login, refresh, logout
///     ├── /users/       admin-only user management
///     ├── /projects/    CRUD, stats, nested task list
///     ├── /tasks/       CRUD, status, assign, comments, timelogs, attachments
///     ├── /comments/    edit, delete
///     ├── /timelogs/    edit, delete
///     ├── /dashboard/   overview, my-tasks
///     └── /reports/     per-project report
/// ```
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/logout", post(routes::auth::logout));

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/:id", get(routes::users::get_user))
        .route("/:id", put(routes::users::update_user))
        .route("/:id", delete(routes::users::delete_user));

    let project_routes = Router::new()
        .route("/", get(routes::projects::list_projects))
        .route("/", post(routes::projects::create_project))
        .route("/:id", get(routes::projects::get_project))
        .route("/:id", put(routes::projects::update_project))
        .route("/:id", delete(routes::projects::delete_project))
        .route("/:id/stats", get(routes::projects::project_stats))
        .route("/:id/tasks", get(routes::tasks::list_tasks))
        .route("/:id/tasks", post(routes::tasks::create_task));

    let task_routes = Router::new()
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .route("/:id/status", put(routes::tasks::update_task_status))
        .route("/:id/assign", put(routes::tasks::assign_task))
        .route("/:id/comments", get(routes::comments::list_comments))
        .route("/:id/comments", post(routes::comments::create_comment))
        .route("/:id/timelogs", get(routes::timelogs::list_time_logs))
        .route("/:id/timelogs", post(routes::timelogs::create_time_log))
        .route("/:id/attachments", get(routes::attachments::list_attachments))
        .route("/:id/attachments", post(routes::attachments::upload_attachment))
        .route(
            "/:id/attachments/:attachment_id",
            get(routes::attachments::download_attachment),
        );

    let comment_routes = Router::new()
        .route("/:id", put(routes::comments::update_comment))
        .route("/:id", delete(routes::comments::delete_comment));

    let timelog_routes = Router::new()
        .route("/:id", put(routes::timelogs::update_time_log))
        .route("/:id", delete(routes::timelogs::delete_time_log));

    let dashboard_routes = Router::new()
        .route("/overview", get(routes::dashboard::overview))
        .route("/my-tasks", get(routes::dashboard::my_tasks));

    let report_routes = Router::new().route(
        "/project/:id",
        get(routes::dashboard::project_report),
    );

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/comments", comment_routes)
        .nest("/timelogs", timelog_routes)
        .nest("/dashboard", dashboard_routes)
        .nest("/reports", report_routes);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        // Body limit must clear the attachment upload ceiling plus
        // multipart framing overhead.
        .layer(DefaultBodyLimit::max(routes::attachments::MAX_UPLOAD_BYTES + 64 * 1024))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            policy_layer,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Authentication and authorization middleware
///
/// Consults the policy table for the route's access rule. Public routes
/// pass untouched. Everything else needs a valid access token; the
/// decoded identity is checked against the allowed roles and stored in
/// the request extensions as [`CurrentUser`].
async fn policy_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // Public routes never look at credentials, so a stale token in the
    // header cannot break login or registration.
    if route_access(&method, &path) == Access::Public {
        return Ok(next.run(req).await);
    }

    let identity = match bearer_token(req.headers()) {
        None => None,
        Some(token) => {
            let claims = state.auth.codec().validate(token).map_err(|_| {
                ApiError::Unauthorized("Invalid or expired access token".to_string())
            })?;

            if claims.kind != TokenKind::Access {
                return Err(ApiError::Unauthorized(
                    "Expected an access token".to_string(),
                ));
            }

            Some(CurrentUser {
                email: claims.sub,
                role: claims.role,
            })
        }
    };

    authorize(&method, &path, identity.as_ref().map(|u| u.role)).map_err(|denial| match denial {
        Denial::Unauthenticated => {
            ApiError::Unauthorized("Missing authorization header".to_string())
        }
        Denial::Forbidden => ApiError::Forbidden("Insufficient permissions".to_string()),
    })?;

    if let Some(user) = identity {
        req.extensions_mut().insert(user);
    }

    Ok(next.run(req).await)
}
