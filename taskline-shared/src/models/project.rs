/// Project model and database operations
///
/// Projects are scoped to their owner: every lookup, update, and delete
/// is keyed by `(id, owner_id)`, so another user's project behaves as if
/// it does not exist rather than being reported as forbidden.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::query::{DateRange, Page, PageParams, QueryError, SortDirection};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,

    pub name: String,

    pub description: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,

    /// User who created the project; all access is scoped to them
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Input for updating a project; only non-`None` fields change.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Filter criteria for the project list. All present criteria are ANDed.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Case-insensitive substring match on the name
    pub name: Option<String>,

    /// Creation-date interval; applied only when both bounds are set
    pub created: DateRange,
}

const SORT_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("startDate", "start_date"),
    ("endDate", "end_date"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

const COLUMNS: &str =
    "id, name, description, start_date, end_date, owner_id, created_at, updated_at";

impl Project {
    pub async fn create(
        pool: &PgPool,
        owner_id: Uuid,
        data: NewProject,
    ) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (name, description, start_date, end_date, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID for a specific owner.
    ///
    /// Returns `None` both when the project does not exist and when it
    /// belongs to someone else.
    pub async fn find_for_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {COLUMNS} FROM projects WHERE id = $1 AND owner_id = $2",
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Updates an owner's project; only fields present in `data` change.
    pub async fn update_for_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE projects SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.start_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", start_date = ${}", bind_count));
        }
        if data.end_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", end_date = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND owner_id = $2 RETURNING {COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id).bind(owner_id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(start_date) = data.start_date {
            q = q.bind(start_date);
        }
        if let Some(end_date) = data.end_date {
            q = q.bind(end_date);
        }

        let project = q.fetch_optional(pool).await?;

        Ok(project)
    }

    /// Deletes an owner's project. Returns whether a row was removed.
    ///
    /// Tasks, comments, time logs, and attachments under the project go
    /// with it via cascading foreign keys.
    pub async fn delete_for_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists an owner's projects matching `filter`, paginated and sorted.
    pub async fn search(
        pool: &PgPool,
        owner_id: Uuid,
        filter: &ProjectFilter,
        params: &PageParams,
    ) -> Result<Page<Self>, QueryError> {
        let order = params.order_by(SORT_FIELDS, "created_at", SortDirection::Desc)?;

        let mut conditions = vec!["owner_id = $1".to_string()];
        let mut bind_count = 1;

        if filter.name.is_some() {
            bind_count += 1;
            conditions.push(format!("name ILIKE ${}", bind_count));
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

        let count_sql = format!("SELECT COUNT(*) FROM projects{}", where_clause);
        let mut count_q = sqlx::query_as::<_, (i64,)>(&count_sql).bind(owner_id);
        if let Some(ref name) = filter.name {
            count_q = count_q.bind(format!("%{}%", name));
        }
        if let Some((from, to)) = filter.created.bounds() {
            count_q = count_q.bind(from).bind(to);
        }
        let (total,) = count_q.fetch_one(pool).await?;

        let rows_sql = format!(
            "SELECT {COLUMNS} FROM projects{} ORDER BY {} LIMIT ${} OFFSET ${}",
            where_clause,
            order,
            bind_count + 1,
            bind_count + 2
        );
        let mut rows_q = sqlx::query_as::<_, Project>(&rows_sql).bind(owner_id);
        if let Some(ref name) = filter.name {
            rows_q = rows_q.bind(format!("%{}%", name));
        }
        if let Some((from, to)) = filter.created.bounds() {
            rows_q = rows_q.bind(from).bind(to);
        }
        let projects = rows_q
            .bind(params.size())
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        Ok(Page::new(projects, params.page(), params.size(), total))
    }
}
