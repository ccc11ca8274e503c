/// User model and database operations
///
/// Users authenticate by email and carry exactly one [`Role`], which the
/// policy table maps to route permissions.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role TEXT NOT NULL DEFAULT 'VIEWER',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskline_shared::models::user::{NewUser, Role, User};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, NewUser {
///     name: "Jane Doe".to_string(),
///     email: "jane@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: Role::Developer,
/// }).await?;
/// println!("Created user: {}", user.id);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::service::UserStore;
use crate::query::{DateRange, Page, PageParams, QueryError, SortDirection};

/// Role held by a user account.
///
/// Stored as TEXT in the database and carried verbatim in token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Role {
    /// Full access, including deletes and user administration
    #[sqlx(rename = "ADMIN")]
    #[serde(rename = "ADMIN")]
    Admin,

    /// Manages projects and tasks
    #[sqlx(rename = "PROJECT_MANAGER")]
    #[serde(rename = "PROJECT_MANAGER")]
    ProjectManager,

    /// Contributes comments, time logs, and attachments
    #[sqlx(rename = "DEVELOPER")]
    #[serde(rename = "DEVELOPER")]
    Developer,

    /// Read-only access; the default for self-registered accounts
    #[sqlx(rename = "VIEWER")]
    #[serde(rename = "VIEWER")]
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::ProjectManager => "PROJECT_MANAGER",
            Role::Developer => "DEVELOPER",
            Role::Viewer => "VIEWER",
        }
    }
}

/// User account row.
///
/// The password hash never leaves the server: it is skipped during
/// serialization so no handler can leak it by returning the model.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Unique login email; also the token subject
    pub email: String,

    /// Argon2id hash in PHC string format
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: Role,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Input for updating a user; only non-`None` fields change.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

/// Filter criteria for the user list. All present criteria are ANDed.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring match on the name
    pub name: Option<String>,

    /// Case-insensitive substring match on the email
    pub email: Option<String>,

    /// Exact role match
    pub role: Option<Role>,

    /// Creation-date interval; applied only when both bounds are set
    pub created: DateRange,
}

/// Request keys accepted by `sortBy` on the user list.
const SORT_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("email", "email"),
    ("role", "role"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

const COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

impl User {
    /// Creates a new user.
    ///
    /// Fails with a unique-constraint violation when the email is taken;
    /// the auth service checks first so it can report the conflict as a
    /// domain error.
    pub async fn create(pool: &PgPool, data: NewUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by exact email match.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates a user; only fields present in `data` change.
    ///
    /// Returns `None` when the user does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if data.role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(role) = data.role {
            q = q.bind(role);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Deletes a user. Returns whether a row was removed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users matching `filter`, paginated and sorted.
    ///
    /// Default order is newest first.
    pub async fn search(
        pool: &PgPool,
        filter: &UserFilter,
        params: &PageParams,
    ) -> Result<Page<Self>, QueryError> {
        let order = params.order_by(SORT_FIELDS, "created_at", SortDirection::Desc)?;

        let mut conditions: Vec<String> = Vec::new();
        let mut bind_count = 0;

        if filter.name.is_some() {
            bind_count += 1;
            conditions.push(format!("name ILIKE ${}", bind_count));
        }
        if filter.email.is_some() {
            bind_count += 1;
            conditions.push(format!("email ILIKE ${}", bind_count));
        }
        if filter.role.is_some() {
            bind_count += 1;
            conditions.push(format!("role = ${}", bind_count));
        }
        if filter.created.bounds().is_some() {
            conditions.push(format!(
                "created_at >= ${} AND created_at <= ${}",
                bind_count + 1,
                bind_count + 2
            ));
            bind_count += 2;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM users{}", where_clause);
        let mut count_q = sqlx::query_as::<_, (i64,)>(&count_sql);
        if let Some(ref name) = filter.name {
            count_q = count_q.bind(format!("%{}%", name));
        }
        if let Some(ref email) = filter.email {
            count_q = count_q.bind(format!("%{}%", email));
        }
        if let Some(role) = filter.role {
            count_q = count_q.bind(role);
        }
        if let Some((from, to)) = filter.created.bounds() {
            count_q = count_q.bind(from).bind(to);
        }
        let (total,) = count_q.fetch_one(pool).await?;

        let rows_sql = format!(
            "SELECT {COLUMNS} FROM users{} ORDER BY {} LIMIT ${} OFFSET ${}",
            where_clause,
            order,
            bind_count + 1,
            bind_count + 2
        );
        let mut rows_q = sqlx::query_as::<_, User>(&rows_sql);
        if let Some(ref name) = filter.name {
            rows_q = rows_q.bind(format!("%{}%", name));
        }
        if let Some(ref email) = filter.email {
            rows_q = rows_q.bind(format!("%{}%", email));
        }
        if let Some(role) = filter.role {
            rows_q = rows_q.bind(role);
        }
        if let Some((from, to)) = filter.created.bounds() {
            rows_q = rows_q.bind(from).bind(to);
        }
        let users = rows_q
            .bind(params.size())
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        Ok(Page::new(users, params.page(), params.size(), total))
    }
}

/// Postgres-backed [`UserStore`] for the auth service.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn insert(&self, data: NewUser) -> Result<User, anyhow::Error> {
        Ok(User::create(&self.pool, data).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_serde() {
        for (role, text) in [
            (Role::Admin, "\"ADMIN\""),
            (Role::ProjectManager, "\"PROJECT_MANAGER\""),
            (Role::Developer, "\"DEVELOPER\""),
            (Role::Viewer, "\"VIEWER\""),
        ] {
            assert_eq!(serde_json::to_string(&role).unwrap(), text);
            assert_eq!(serde_json::from_str::<Role>(text).unwrap(), role);
            assert_eq!(format!("\"{}\"", role.as_str()), text);
        }
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Viewer,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password_hash"));
    }

    #[test]
    fn test_update_user_default_is_noop() {
        let update = UpdateUser::default();
        assert!(update.name.is_none());
        assert!(update.email.is_none());
        assert!(update.password_hash.is_none());
        assert!(update.role.is_none());
    }

    // Integration tests for database operations live in the API crate's
    // tests directory and require a running Postgres.
}
