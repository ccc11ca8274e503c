/// Task attachment endpoints
///
/// # Endpoints
///
/// - `POST /api/tasks/:id/attachments` - Upload a file (multipart)
/// - `GET /api/tasks/:id/attachments` - List attachment metadata
/// - `GET /api/tasks/:id/attachments/:attachment_id` - Download

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue},
    Extension, Json,
};
use uuid::Uuid;

use taskline_shared::auth::identity::CurrentUser;
use taskline_shared::models::attachment::{Attachment, AttachmentMeta, NewAttachment};
use taskline_shared::models::task::Task;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::current_db_user,
};

/// Maximum accepted upload size (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Stores the uploaded file from the multipart field named `file`.
pub async fn upload_attachment(
    State(state): State<AppState>,
    Extension(identity): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<AttachmentMeta>> {
    let user = current_db_user(&state, &identity).await?;

    Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::BadRequest("File field is missing a filename".to_string()))?;
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        if data.is_empty() {
            return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
        }
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::BadRequest(format!(
                "File exceeds the {} byte limit",
                MAX_UPLOAD_BYTES
            )));
        }

        let meta = Attachment::create(
            &state.db,
            task_id,
            user.id,
            NewAttachment {
                file_name,
                content_type,
                data: data.to_vec(),
            },
        )
        .await?;

        return Ok(Json(meta));
    }

    Err(ApiError::BadRequest(
        "Multipart field 'file' is required".to_string(),
    ))
}

/// Lists a task's attachments without payloads.
pub async fn list_attachments(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<AttachmentMeta>>> {
    Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let metas = Attachment::list_for_task(&state.db, task_id).await?;
    Ok(Json(metas))
}

/// Downloads an attachment's payload with its stored content type.
pub async fn download_attachment(
    State(state): State<AppState>,
    Path((task_id, attachment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<(HeaderMap, Vec<u8>)> {
    let attachment = Attachment::find_for_task(&state.db, task_id, attachment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attachment not found".to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&attachment.content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!(
            "attachment; filename=\"{}\"",
            attachment.file_name.replace('"', "")
        ))
        .unwrap_or(HeaderValue::from_static("attachment")),
    );

    Ok((headers, attachment.data))
}
