/// Task model and database operations
///
/// Tasks belong to a project and may be assigned to a user. New tasks
/// start as `PENDING` with `MEDIUM` priority unless the caller says
/// otherwise.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status TEXT NOT NULL DEFAULT 'PENDING',
///     priority TEXT NOT NULL DEFAULT 'MEDIUM',
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     due_date DATE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::query::{DateRange, Page, PageParams, QueryError, SortDirection};

/// Task workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum TaskStatus {
    #[sqlx(rename = "PENDING")]
    #[serde(rename = "PENDING")]
    Pending,

    #[sqlx(rename = "IN_PROGRESS")]
    #[serde(rename = "IN_PROGRESS")]
    InProgress,

    #[sqlx(rename = "COMPLETED")]
    #[serde(rename = "COMPLETED")]
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum TaskPriority {
    #[sqlx(rename = "LOW")]
    #[serde(rename = "LOW")]
    Low,

    #[sqlx(rename = "MEDIUM")]
    #[serde(rename = "MEDIUM")]
    Medium,

    #[sqlx(rename = "HIGH")]
    #[serde(rename = "HIGH")]
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    pub project_id: Uuid,

    pub title: String,

    pub description: Option<String>,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    /// Assigned user, if any
    pub assignee_id: Option<Uuid>,

    pub due_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task. Missing status/priority take the defaults.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

/// Input for updating a task; only non-`None` fields change.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

/// Filter criteria for a project's task list. All present criteria are
/// ANDed.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring match on the title
    pub title: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub assignee_id: Option<Uuid>,

    /// Creation-date interval; applied only when both bounds are set
    pub created: DateRange,
}

/// Filter for the tasks assigned to a user (dashboard view).
///
/// Unlike [`TaskFilter::created`], each due-date bound applies on its
/// own, so an open-ended "due before" or "due after" query works.
#[derive(Debug, Clone, Default)]
pub struct AssignedTaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
}

/// Per-status task counts for a project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
}

impl TaskStats {
    /// Share of tasks completed, as a percentage. Zero tasks is 0%.
    pub fn completion_percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 * 100.0 / self.total as f64
        }
    }
}

/// Per-priority task counts for a project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityStats {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
}

const SORT_FIELDS: &[(&str, &str)] = &[
    ("title", "title"),
    ("status", "status"),
    ("priority", "priority"),
    ("dueDate", "due_date"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

const COLUMNS: &str = "id, project_id, title, description, status, priority, assignee_id, \
                       due_date, created_at, updated_at";

impl Task {
    pub async fn create(
        pool: &PgPool,
        project_id: Uuid,
        data: NewTask,
    ) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (project_id, title, description, status, priority, assignee_id, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(project_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status.unwrap_or(TaskStatus::Pending))
        .bind(data.priority.unwrap_or(TaskPriority::Medium))
        .bind(data.assignee_id)
        .bind(data.due_date)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {COLUMNS} FROM tasks WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Updates a task; only fields present in `data` change.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.assignee_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assignee_id = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(assignee_id) = data.assignee_id {
            q = q.bind(assignee_id);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Moves a task to a new workflow status.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Assigns a task to a user (or unassigns with `None`).
    pub async fn assign(
        pool: &PgPool,
        id: Uuid,
        assignee_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET assignee_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(assignee_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a project's tasks matching `filter`, paginated and sorted.
    pub async fn search(
        pool: &PgPool,
        project_id: Uuid,
        filter: &TaskFilter,
        params: &PageParams,
    ) -> Result<Page<Self>, QueryError> {
        let order = params.order_by(SORT_FIELDS, "created_at", SortDirection::Desc)?;

        let mut conditions = vec!["project_id = $1".to_string()];
        let mut bind_count = 1;

        if filter.title.is_some() {
            bind_count += 1;
            conditions.push(format!("title ILIKE ${}", bind_count));
        }
        if filter.status.is_some() {
            bind_count += 1;
            conditions.push(format!("status = ${}", bind_count));
        }
        if filter.priority.is_some() {
            bind_count += 1;
            conditions.push(format!("priority = ${}", bind_count));
        }
        if filter.assignee_id.is_some() {
            bind_count += 1;
            conditions.push(format!("assignee_id = ${}", bind_count));
        }
        if filter.created.bounds().is_some() {
            conditions.push(format!(
                "created_at >= ${} AND created_at <= ${}",
                bind_count + 1,
                bind_count + 2
            ));
            bind_count += 2;
        }

        let where_clause = format!(" WHERE {}", conditions.join(" AND "));

        let count_sql = format!("SELECT COUNT(*) FROM tasks{}", where_clause);
        let mut count_q = sqlx::query_as::<_, (i64,)>(&count_sql).bind(project_id);
        if let Some(ref title) = filter.title {
            count_q = count_q.bind(format!("%{}%", title));
        }
        if let Some(status) = filter.status {
            count_q = count_q.bind(status);
        }
        if let Some(priority) = filter.priority {
            count_q = count_q.bind(priority);
        }
        if let Some(assignee_id) = filter.assignee_id {
            count_q = count_q.bind(assignee_id);
        }
        if let Some((from, to)) = filter.created.bounds() {
            count_q = count_q.bind(from).bind(to);
        }
        let (total,) = count_q.fetch_one(pool).await?;

        let rows_sql = format!(
            "SELECT {COLUMNS} FROM tasks{} ORDER BY {} LIMIT ${} OFFSET ${}",
            where_clause,
            order,
            bind_count + 1,
            bind_count + 2
        );
        let mut rows_q = sqlx::query_as::<_, Task>(&rows_sql).bind(project_id);
        if let Some(ref title) = filter.title {
            rows_q = rows_q.bind(format!("%{}%", title));
        }
        if let Some(status) = filter.status {
            rows_q = rows_q.bind(status);
        }
        if let Some(priority) = filter.priority {
            rows_q = rows_q.bind(priority);
        }
        if let Some(assignee_id) = filter.assignee_id {
            rows_q = rows_q.bind(assignee_id);
        }
        if let Some((from, to)) = filter.created.bounds() {
            rows_q = rows_q.bind(from).bind(to);
        }
        let tasks = rows_q
            .bind(params.size())
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        Ok(Page::new(tasks, params.page(), params.size(), total))
    }

    /// Lists the tasks assigned to a user, due-soonest first by default.
    pub async fn search_assigned(
        pool: &PgPool,
        assignee_id: Uuid,
        filter: &AssignedTaskFilter,
        params: &PageParams,
    ) -> Result<Page<Self>, QueryError> {
        let order = params.order_by(SORT_FIELDS, "due_date", SortDirection::Asc)?;

        let mut conditions = vec!["assignee_id = $1".to_string()];
        let mut bind_count = 1;

        if filter.status.is_some() {
            bind_count += 1;
            conditions.push(format!("status = ${}", bind_count));
        }
        if filter.priority.is_some() {
            bind_count += 1;
            conditions.push(format!("priority = ${}", bind_count));
        }
        // Due-date bounds apply independently
        if filter.due_from.is_some() {
            bind_count += 1;
            conditions.push(format!("due_date >= ${}", bind_count));
        }
        if filter.due_to.is_some() {
            bind_count += 1;
            conditions.push(format!("due_date <= ${}", bind_count));
        }

        let where_clause = format!(" WHERE {}", conditions.join(" AND "));

        let count_sql = format!("SELECT COUNT(*) FROM tasks{}", where_clause);
        let mut count_q = sqlx::query_as::<_, (i64,)>(&count_sql).bind(assignee_id);
        if let Some(status) = filter.status {
            count_q = count_q.bind(status);
        }
        if let Some(priority) = filter.priority {
            count_q = count_q.bind(priority);
        }
        if let Some(due_from) = filter.due_from {
            count_q = count_q.bind(due_from);
        }
        if let Some(due_to) = filter.due_to {
            count_q = count_q.bind(due_to);
        }
        let (total,) = count_q.fetch_one(pool).await?;

        let rows_sql = format!(
            "SELECT {COLUMNS} FROM tasks{} ORDER BY {} LIMIT ${} OFFSET ${}",
            where_clause,
            order,
            bind_count + 1,
            bind_count + 2
        );
        let mut rows_q = sqlx::query_as::<_, Task>(&rows_sql).bind(assignee_id);
        if let Some(status) = filter.status {
            rows_q = rows_q.bind(status);
        }
        if let Some(priority) = filter.priority {
            rows_q = rows_q.bind(priority);
        }
        if let Some(due_from) = filter.due_from {
            rows_q = rows_q.bind(due_from);
        }
        if let Some(due_to) = filter.due_to {
            rows_q = rows_q.bind(due_to);
        }
        let tasks = rows_q
            .bind(params.size())
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        Ok(Page::new(tasks, params.page(), params.size(), total))
    }

    /// Per-status counts for a project's tasks.
    pub async fn stats_for_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<TaskStats, sqlx::Error> {
        let rows: Vec<(TaskStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM tasks WHERE project_id = $1 GROUP BY status",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        let mut stats = TaskStats {
            total: 0,
            pending: 0,
            in_progress: 0,
            completed: 0,
        };
        for (status, count) in rows {
            stats.total += count;
            match status {
                TaskStatus::Pending => stats.pending = count,
                TaskStatus::InProgress => stats.in_progress = count,
                TaskStatus::Completed => stats.completed = count,
            }
        }

        Ok(stats)
    }

    /// Per-priority counts for a project's tasks.
    pub async fn priority_stats_for_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<PriorityStats, sqlx::Error> {
        let rows: Vec<(TaskPriority, i64)> = sqlx::query_as(
            "SELECT priority, COUNT(*) FROM tasks WHERE project_id = $1 GROUP BY priority",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        let mut stats = PriorityStats {
            low: 0,
            medium: 0,
            high: 0,
        };
        for (priority, count) in rows {
            match priority {
                TaskPriority::Low => stats.low = count,
                TaskPriority::Medium => stats.medium = count,
                TaskPriority::High => stats.high = count,
            }
        }

        Ok(stats)
    }

    /// Per-status counts for the tasks assigned to a user.
    pub async fn stats_for_assignee(
        pool: &PgPool,
        assignee_id: Uuid,
    ) -> Result<TaskStats, sqlx::Error> {
        let rows: Vec<(TaskStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM tasks WHERE assignee_id = $1 GROUP BY status",
        )
        .bind(assignee_id)
        .fetch_all(pool)
        .await?;

        let mut stats = TaskStats {
            total: 0,
            pending: 0,
            in_progress: 0,
            completed: 0,
        };
        for (status, count) in rows {
            stats.total += count;
            match status {
                TaskStatus::Pending => stats.pending = count,
                TaskStatus::InProgress => stats.in_progress = count,
                TaskStatus::Completed => stats.completed = count,
            }
        }

        Ok(stats)
    }

    /// Counts a user's assigned tasks that are past due and not completed.
    pub async fn count_overdue_for_assignee(
        pool: &PgPool,
        assignee_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM tasks
            WHERE assignee_id = $1
              AND due_date < CURRENT_DATE
              AND status <> 'COMPLETED'
            "#,
        )
        .bind(assignee_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"PENDING\"").unwrap(),
            TaskStatus::Pending
        );
        assert_eq!(TaskStatus::Completed.as_str(), "COMPLETED");
    }

    #[test]
    fn test_priority_wire_format() {
        assert_eq!(serde_json::to_string(&TaskPriority::High).unwrap(), "\"HIGH\"");
        assert_eq!(
            serde_json::from_str::<TaskPriority>("\"MEDIUM\"").unwrap(),
            TaskPriority::Medium
        );
        assert_eq!(TaskPriority::Low.as_str(), "LOW");
    }

    #[test]
    fn test_completion_percentage() {
        let empty = TaskStats {
            total: 0,
            pending: 0,
            in_progress: 0,
            completed: 0,
        };
        assert_eq!(empty.completion_percentage(), 0.0);

        let half = TaskStats {
            total: 4,
            pending: 1,
            in_progress: 1,
            completed: 2,
        };
        assert_eq!(half.completion_percentage(), 50.0);
    }

    #[test]
    fn test_new_task_defaults() {
        let data = NewTask {
            title: "Write report".to_string(),
            description: None,
            status: None,
            priority: None,
            assignee_id: None,
            due_date: None,
        };
        assert_eq!(data.status.unwrap_or(TaskStatus::Pending), TaskStatus::Pending);
        assert_eq!(
            data.priority.unwrap_or(TaskPriority::Medium),
            TaskPriority::Medium
        );
    }
}
