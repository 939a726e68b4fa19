/// Schema bootstrap
///
/// Creates the enum types, tables and indexes the [`crate::store::PgStore`]
/// expects. Every statement is idempotent, so `ensure_schema` runs on each
/// startup and is a no-op against an existing database.
///
/// This is not a migration system: existing tables are never altered.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskboard_shared::db::schema::ensure_schema;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// ensure_schema(&pool).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use tracing::{debug, info};

/// Statements applied in order. Enum creation swallows `duplicate_object`
/// because PostgreSQL has no `CREATE TYPE IF NOT EXISTS`.
const SCHEMA: &[&str] = &[
    r#"
    DO $$ BEGIN
        CREATE TYPE user_role AS ENUM ('admin', 'member');
    EXCEPTION
        WHEN duplicate_object THEN NULL;
    END $$
    "#,
    r#"
    DO $$ BEGIN
        CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'done');
    EXCEPTION
        WHEN duplicate_object THEN NULL;
    END $$
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        email VARCHAR(255) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        role user_role NOT NULL DEFAULT 'member',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id BIGSERIAL PRIMARY KEY,
        project_id BIGINT NOT NULL REFERENCES projects(id),
        title VARCHAR(255) NOT NULL,
        status task_status NOT NULL DEFAULT 'todo',
        assignee_user_id BIGINT NOT NULL REFERENCES users(id),
        due_date TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ,
        version BIGINT NOT NULL DEFAULT 1 CHECK (version >= 1)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_tasks_project_id ON tasks(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_assignee_user_id ON tasks(assignee_user_id)",
];

/// Creates any missing schema objects
///
/// # Errors
///
/// Returns the first failing statement's error; earlier statements stay applied.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Ensuring database schema");

    for (index, statement) in SCHEMA.iter().enumerate() {
        debug!(statement = index, "Applying schema statement");
        sqlx::query(statement).execute(pool).await?;
    }

    info!(statements = SCHEMA.len(), "Database schema ready");
    Ok(())
}
