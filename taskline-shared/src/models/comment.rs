/// Comment model and database operations
///
/// Comments hang off tasks. Anyone with read access sees them; editing
/// is keyed by `(id, author_id)` so only the author's own comments are
/// reachable for update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::query::{Page, PageParams, QueryError, SortDirection};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,

    pub task_id: Uuid,

    pub author_id: Uuid,

    pub content: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

const SORT_FIELDS: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

const COLUMNS: &str = "id, task_id, author_id, content, created_at, updated_at";

impl Comment {
    pub async fn create(
        pool: &PgPool,
        task_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<Self, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (task_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(task_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COLUMNS} FROM comments WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Rewrites the content of the author's own comment.
    ///
    /// Returns `None` when the comment does not exist or belongs to a
    /// different author.
    pub async fn update_for_author(
        pool: &PgPool,
        id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            UPDATE comments
            SET content = $3, updated_at = NOW()
            WHERE id = $1 AND author_id = $2
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(author_id)
        .bind(content)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a task's comments, newest first by default.
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: Uuid,
        params: &PageParams,
    ) -> Result<Page<Self>, QueryError> {
        let order = params.order_by(SORT_FIELDS, "created_at", SortDirection::Desc)?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE task_id = $1")
            .bind(task_id)
            .fetch_one(pool)
            .await?;

        let comments = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COLUMNS} FROM comments WHERE task_id = $1 ORDER BY {} LIMIT $2 OFFSET $3",
            order,
        ))
        .bind(task_id)
        .bind(params.size())
        .bind(params.offset())
        .fetch_all(pool)
        .await?;

        Ok(Page::new(comments, params.page(), params.size(), total))
    }
}
