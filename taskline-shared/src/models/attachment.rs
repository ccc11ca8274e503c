/// Task attachment model and database operations
///
/// Attachments are stored inline as bytea. Listings return metadata
/// only; the payload is fetched just for downloads so the list endpoint
/// never drags file bodies across the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Attachment row including the payload. Fetched only for downloads.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub data: Vec<u8>,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Attachment metadata without the payload.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    pub id: Uuid,
    pub task_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Input for storing an uploaded file.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

const META_COLUMNS: &str =
    "id, task_id, file_name, content_type, size_bytes, uploaded_by, created_at";

impl Attachment {
    pub async fn create(
        pool: &PgPool,
        task_id: Uuid,
        uploaded_by: Uuid,
        data: NewAttachment,
    ) -> Result<AttachmentMeta, sqlx::Error> {
        let size_bytes = data.data.len() as i64;
        let meta = sqlx::query_as::<_, AttachmentMeta>(&format!(
            r#"
            INSERT INTO task_attachments (task_id, file_name, content_type, size_bytes, data, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {META_COLUMNS}
            "#,
        ))
        .bind(task_id)
        .bind(data.file_name)
        .bind(data.content_type)
        .bind(size_bytes)
        .bind(data.data)
        .bind(uploaded_by)
        .fetch_one(pool)
        .await?;

        Ok(meta)
    }

    /// Fetches an attachment with its payload, scoped to its task.
    pub async fn find_for_task(
        pool: &PgPool,
        task_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let attachment = sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {META_COLUMNS}, data FROM task_attachments WHERE id = $2 AND task_id = $1",
        ))
        .bind(task_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(attachment)
    }

    /// Lists a task's attachments without payloads, newest first.
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Vec<AttachmentMeta>, sqlx::Error> {
        let metas = sqlx::query_as::<_, AttachmentMeta>(&format!(
            "SELECT {META_COLUMNS} FROM task_attachments WHERE task_id = $1 ORDER BY created_at DESC",
        ))
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(metas)
    }
}
