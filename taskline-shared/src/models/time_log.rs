/// Time log model and database operations
///
/// Time logs record work against a task: who, when they started, and
/// optionally when they stopped and for how many minutes. A duration,
/// when given, is validated at the API boundary to be at least one
/// minute.
///
/// Start-time filter bounds apply independently, unlike creation-date
/// filters elsewhere: a lone `from` or `to` still narrows the list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::query::{Page, PageParams, QueryError, SortDirection};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimeLog {
    pub id: Uuid,

    pub task_id: Uuid,

    /// User who logged the time
    pub user_id: Uuid,

    pub start_time: DateTime<Utc>,

    pub end_time: Option<DateTime<Utc>>,

    /// Whole minutes worked, at least 1 when present
    pub duration_minutes: Option<i32>,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a time log.
#[derive(Debug, Clone)]
pub struct NewTimeLog {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub description: Option<String>,
}

/// Input for updating a time log; only non-`None` fields change.
#[derive(Debug, Clone, Default)]
pub struct UpdateTimeLog {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub description: Option<String>,
}

/// Filter criteria for a task's time log list.
#[derive(Debug, Clone, Default)]
pub struct TimeLogFilter {
    /// Only logs by this user
    pub user_id: Option<Uuid>,

    /// Independent lower bound on start time
    pub start_from: Option<DateTime<Utc>>,

    /// Independent upper bound on start time
    pub start_to: Option<DateTime<Utc>>,
}

/// Minutes logged against a project by one user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserMinutes {
    pub user_id: Uuid,
    pub total_minutes: i64,
}

const SORT_FIELDS: &[(&str, &str)] = &[
    ("startTime", "start_time"),
    ("endTime", "end_time"),
    ("durationMinutes", "duration_minutes"),
    ("createdAt", "created_at"),
];

const COLUMNS: &str = "id, task_id, user_id, start_time, end_time, duration_minutes, \
                       description, created_at, updated_at";

impl TimeLog {
    pub async fn create(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        data: NewTimeLog,
    ) -> Result<Self, sqlx::Error> {
        let log = sqlx::query_as::<_, TimeLog>(&format!(
            r#"
            INSERT INTO time_logs (task_id, user_id, start_time, end_time, duration_minutes, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(task_id)
        .bind(user_id)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.duration_minutes)
        .bind(data.description)
        .fetch_one(pool)
        .await?;

        Ok(log)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let log = sqlx::query_as::<_, TimeLog>(&format!(
            "SELECT {COLUMNS} FROM time_logs WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(log)
    }

    /// Updates the caller's own time log; only fields present change.
    ///
    /// Returns `None` when the log does not exist or was written by a
    /// different user.
    pub async fn update_for_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateTimeLog,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE time_logs SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.start_time.is_some() {
            bind_count += 1;
            query.push_str(&format!(", start_time = ${}", bind_count));
        }
        if data.end_time.is_some() {
            bind_count += 1;
            query.push_str(&format!(", end_time = ${}", bind_count));
        }
        if data.duration_minutes.is_some() {
            bind_count += 1;
            query.push_str(&format!(", duration_minutes = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, TimeLog>(&query).bind(id).bind(user_id);

        if let Some(start_time) = data.start_time {
            q = q.bind(start_time);
        }
        if let Some(end_time) = data.end_time {
            q = q.bind(end_time);
        }
        if let Some(duration_minutes) = data.duration_minutes {
            q = q.bind(duration_minutes);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }

        let log = q.fetch_optional(pool).await?;

        Ok(log)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM time_logs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a task's time logs, most recent start first by default.
    pub async fn search(
        pool: &PgPool,
        task_id: Uuid,
        filter: &TimeLogFilter,
        params: &PageParams,
    ) -> Result<Page<Self>, QueryError> {
        let order = params.order_by(SORT_FIELDS, "start_time", SortDirection::Desc)?;

        let mut conditions = vec!["task_id = $1".to_string()];
        let mut bind_count = 1;

        if filter.user_id.is_some() {
            bind_count += 1;
            conditions.push(format!("user_id = ${}", bind_count));
        }
        if filter.start_from.is_some() {
            bind_count += 1;
            conditions.push(format!("start_time >= ${}", bind_count));
        }
        if filter.start_to.is_some() {
            bind_count += 1;
            conditions.push(format!("start_time <= ${}", bind_count));
        }

        let where_clause = format!(" WHERE {}", conditions.join(" AND "));

        let count_sql = format!("SELECT COUNT(*) FROM time_logs{}", where_clause);
        let mut count_q = sqlx::query_as::<_, (i64,)>(&count_sql).bind(task_id);
        if let Some(user_id) = filter.user_id {
            count_q = count_q.bind(user_id);
        }
        if let Some(start_from) = filter.start_from {
            count_q = count_q.bind(start_from);
        }
        if let Some(start_to) = filter.start_to {
            count_q = count_q.bind(start_to);
        }
        let (total,) = count_q.fetch_one(pool).await?;

        let rows_sql = format!(
            "SELECT {COLUMNS} FROM time_logs{} ORDER BY {} LIMIT ${} OFFSET ${}",
            where_clause,
            order,
            bind_count + 1,
            bind_count + 2
        );
        let mut rows_q = sqlx::query_as::<_, TimeLog>(&rows_sql).bind(task_id);
        if let Some(user_id) = filter.user_id {
            rows_q = rows_q.bind(user_id);
        }
        if let Some(start_from) = filter.start_from {
            rows_q = rows_q.bind(start_from);
        }
        if let Some(start_to) = filter.start_to {
            rows_q = rows_q.bind(start_to);
        }
        let logs = rows_q
            .bind(params.size())
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        Ok(Page::new(logs, params.page(), params.size(), total))
    }

    /// Total minutes a user has logged across all tasks.
    pub async fn total_minutes_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(duration_minutes), 0) FROM time_logs WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(total)
    }

    /// Total minutes logged against a project's tasks.
    pub async fn total_minutes_for_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(tl.duration_minutes), 0)
            FROM time_logs tl
            JOIN tasks t ON t.id = tl.task_id
            WHERE t.project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_one(pool)
        .await?;

        Ok(total)
    }

    /// Minutes logged against a project, broken down per user.
    pub async fn minutes_by_user_for_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<UserMinutes>, sqlx::Error> {
        let rows = sqlx::query_as::<_, UserMinutes>(
            r#"
            SELECT tl.user_id, COALESCE(SUM(tl.duration_minutes), 0) AS total_minutes
            FROM time_logs tl
            JOIN tasks t ON t.id = tl.task_id
            WHERE t.project_id = $1
            GROUP BY tl.user_id
            ORDER BY total_minutes DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
