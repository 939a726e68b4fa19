/// PostgreSQL store
///
/// Implements [`Store`] with sqlx against the schema created by
/// [`crate::db::schema::ensure_schema`].
///
/// The conditional task update is a single `UPDATE ... WHERE id = $1 AND
/// version = $2 ... RETURNING` statement, so the version check and the write
/// happen atomically inside PostgreSQL even with many API processes sharing
/// the database.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskboard_shared::store::{PgStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// let store = PgStore::new(pool);
/// let projects = store.list_projects(Some("web")).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::PgPool;

use super::{Store, StoreError, TaskQuery, UpdateCondition};
use crate::models::{
    CreateProject, CreateTask, CreateUser, Project, ProjectId, Task, TaskId, TaskPatch, User,
    UserId,
};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";
const PROJECT_COLUMNS: &str = "id, name, description, created_at";
const TASK_COLUMNS: &str =
    "id, project_id, title, status, assignee_user_id, due_date, created_at, updated_at, version";

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps constraint violations onto store errors
fn classify(err: sqlx::Error, reference: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            return StoreError::Duplicate(constraint);
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference(reference.to_string());
        }
    }
    StoreError::Database(err)
}

/// Escapes LIKE wildcards so user input matches literally
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "user"))
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_project(&self, data: CreateProject) -> Result<Project, StoreError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (name, description) VALUES ($1, $2) RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(data.name)
        .bind(data.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(project)
    }

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn list_projects(&self, name_contains: Option<&str>) -> Result<Vec<Project>, StoreError> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\')
            ORDER BY id
            "#
        ))
        .bind(name_contains.map(like_pattern))
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (project_id, title, assignee_user_id, due_date) \
             VALUES ($1, $2, $3, $4) RETURNING {TASK_COLUMNS}"
        ))
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.assignee_user_id)
        .bind(data.due_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "project or user"))
    }

    async fn find_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn list_tasks(&self, query: TaskQuery) -> Result<Vec<Task>, StoreError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE project_id = $1
              AND ($2::bigint IS NULL OR assignee_user_id = $2)
              AND ($3::task_status IS NULL OR status = $3)
              AND ($4::bigint IS NULL OR assignee_user_id = $4)
            ORDER BY id
            "#
        ))
        .bind(query.project_id)
        .bind(query.visible_to)
        .bind(query.status)
        .bind(query.assignee)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn update_task_if(
        &self,
        id: TaskId,
        condition: UpdateCondition,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, StoreError> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($4, title),
                status = COALESCE($5, status),
                assignee_user_id = COALESCE($6, assignee_user_id),
                due_date = CASE WHEN $7 THEN $8 ELSE due_date END,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1
              AND version = $2
              AND ($3::bigint IS NULL OR assignee_user_id = $3)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(condition.expected_version)
        .bind(condition.assignee)
        .bind(patch.title.as_deref())
        .bind(patch.status)
        .bind(patch.assignee_user_id)
        .bind(patch.due_date.is_some())
        .bind(patch.due_date.flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "user"))
    }
}
