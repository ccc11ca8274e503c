/// Error handling for the API server
///
/// A unified error type that maps to HTTP responses. All handlers
/// return `Result<T, ApiError>` which converts to the right status
/// code and a JSON body.
///
/// Status mapping follows the auth contract: failed credentials and
/// unusable tokens on the auth endpoints are client errors (400), while
/// a missing or invalid bearer credential on a protected route is 401
/// and an insufficient role is 403.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use taskline_shared::auth::service::AuthError;
use taskline_shared::query::QueryError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Validation errors (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g. "bad_request", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Maps a named constraint violation to a client error.
///
/// Constraint violations come from client-supplied values (a duplicate
/// email, an out-of-range duration), so they surface as 400s like the
/// rest of the rejected-input cases.
fn constraint_error(constraint: &str) -> ApiError {
    if constraint.contains("email") {
        ApiError::BadRequest("Email already in use".to_string())
    } else {
        ApiError::BadRequest(format!("Constraint violation: {}", constraint))
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    return constraint_error(constraint);
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert auth flow errors to API errors
///
/// Auth endpoint failures are 400s: the request itself was well-formed
/// HTTP, the credentials or tokens in it were not acceptable.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailInUse => ApiError::BadRequest("Email already in use".to_string()),
            AuthError::NotFound => ApiError::NotFound("User not found".to_string()),
            AuthError::InvalidCredentials => {
                ApiError::BadRequest("Invalid credentials".to_string())
            }
            AuthError::InvalidToken => {
                ApiError::BadRequest("Refresh token is invalid or expired".to_string())
            }
            AuthError::WrongKind => {
                ApiError::BadRequest("Token is not a refresh token".to_string())
            }
            AuthError::NotAuthorized => {
                ApiError::BadRequest("Refresh token is not authorized".to_string())
            }
            AuthError::UserGone => ApiError::BadRequest("User no longer exists".to_string()),
            AuthError::Password(e) => {
                ApiError::InternalError(format!("Password operation failed: {}", e))
            }
            AuthError::Issue(e) => ApiError::InternalError(format!("Token issuance failed: {}", e)),
            AuthError::Store(e) => ApiError::InternalError(format!("User store error: {}", e)),
        }
    }
}

/// Convert list-query errors to API errors
impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::UnknownSortField(field) => {
                ApiError::BadRequest(format!("Unknown sort field: {}", field))
            }
            QueryError::InvalidDirection(dir) => {
                ApiError::BadRequest(format!("Invalid sort direction: {}", dir))
            }
            QueryError::Db(e) => e.into(),
        }
    }
}

/// Convert request-body validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_auth_failures_are_client_errors() {
        assert!(matches!(
            ApiError::from(AuthError::InvalidCredentials),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(AuthError::NotAuthorized),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(AuthError::NotFound),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_constraint_violations_are_client_errors() {
        match constraint_error("users_email_key") {
            ApiError::BadRequest(msg) => assert!(msg.contains("mail")),
            other => panic!("expected BadRequest, got {:?}", other),
        }
        assert!(matches!(
            constraint_error("time_logs_duration_minutes_check"),
            ApiError::BadRequest(_)
        ));
    }

    #[test]
    fn test_unknown_sort_field_is_bad_request() {
        let err = ApiError::from(QueryError::UnknownSortField("passwordHash".to_string()));
        match err {
            ApiError::BadRequest(msg) => assert!(msg.contains("passwordHash")),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }
}
