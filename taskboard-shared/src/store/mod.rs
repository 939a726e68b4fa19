/// Persistence layer
///
/// Everything the API needs from storage goes through the [`Store`] trait:
/// record-by-id lookups, filtered listings, inserts, and one conditional
/// update used for optimistic locking.
///
/// # Implementations
///
/// - [`postgres::PgStore`]: PostgreSQL via sqlx (production)
/// - [`memory::MemoryStore`]: in-process tables behind a tokio `RwLock`
///   (tests and database-less runs)
///
/// Both implementations serialize [`Store::update_task_if`] per task, so two
/// writers presenting the same expected version can never both succeed.

use async_trait::async_trait;

use crate::models::{
    CreateProject, CreateTask, CreateUser, Project, ProjectId, Task, TaskFilter, TaskId,
    TaskPatch, TaskStatus, User, UserId,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (e.g. duplicate email)
    #[error("Duplicate value for {0}")]
    Duplicate(String),

    /// A referenced row does not exist
    #[error("Referenced {0} does not exist")]
    MissingReference(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fully resolved task listing query
///
/// Produced by [`crate::auth::policy::Access::scope`]: the role scope and
/// caller filters are all conjunctive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskQuery {
    /// Project to list
    pub project_id: ProjectId,

    /// Role scope: restrict to this assignee (members)
    pub visible_to: Option<UserId>,

    /// Caller filter on status
    pub status: Option<TaskStatus>,

    /// Caller filter on assignee
    pub assignee: Option<UserId>,
}

impl TaskQuery {
    /// Query for every task in a project, no filters
    pub fn project(project_id: ProjectId) -> Self {
        Self {
            project_id,
            visible_to: None,
            status: None,
            assignee: None,
        }
    }

    /// Adds caller filters
    pub fn with_filter(mut self, filter: TaskFilter) -> Self {
        self.status = filter.status;
        self.assignee = filter.assignee;
        self
    }

    /// Whether a task satisfies every clause of the query
    pub fn matches(&self, task: &Task) -> bool {
        task.project_id == self.project_id
            && self.visible_to.map_or(true, |id| task.assignee_user_id == id)
            && self.status.map_or(true, |status| task.status == status)
            && self.assignee.map_or(true, |id| task.assignee_user_id == id)
    }
}

/// Preconditions for a conditional task update
///
/// The update applies only if the stored row still satisfies every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateCondition {
    /// Version the caller read
    pub expected_version: i64,

    /// Required current assignee (set for members)
    pub assignee: Option<UserId>,
}

impl UpdateCondition {
    /// Whether a stored task satisfies the condition
    pub fn holds_for(&self, task: &Task) -> bool {
        task.version == self.expected_version
            && self.assignee.map_or(true, |id| task.assignee_user_id == id)
    }
}

/// Persistence operations used by the API
#[async_trait]
pub trait Store: Send + Sync {
    /// Verifies the backing store is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Inserts a user
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError>;

    /// Finds a user by ID
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Finds a user by exact email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Inserts a project
    async fn create_project(&self, data: CreateProject) -> Result<Project, StoreError>;

    /// Finds a project by ID
    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;

    /// Lists projects, optionally by case-insensitive name substring, ordered by ID
    async fn list_projects(&self, name_contains: Option<&str>) -> Result<Vec<Project>, StoreError>;

    /// Inserts a task at version 1
    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError>;

    /// Finds a task by ID
    async fn find_task(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// Lists tasks matching every clause of `query`, ordered by ID
    async fn list_tasks(&self, query: TaskQuery) -> Result<Vec<Task>, StoreError>;

    /// Compare-and-swap update
    ///
    /// Atomically applies `patch`, increments `version` by one and stamps
    /// `updated_at`, but only if the stored row satisfies `condition`.
    /// Returns `None` when no row matched (absent or condition failed); the
    /// caller re-reads to tell those apart.
    async fn update_task_if(
        &self,
        id: TaskId,
        condition: UpdateCondition,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(assignee: UserId, status: TaskStatus) -> Task {
        Task {
            id: 1,
            project_id: 10,
            title: "t".to_string(),
            status,
            assignee_user_id: assignee,
            due_date: None,
            created_at: Utc::now(),
            updated_at: None,
            version: 3,
        }
    }

    #[test]
    fn test_query_matches_project_only() {
        let query = TaskQuery::project(10);
        assert!(query.matches(&task(1, TaskStatus::Todo)));
        assert!(!TaskQuery::project(11).matches(&task(1, TaskStatus::Todo)));
    }

    #[test]
    fn test_query_filters_intersect() {
        let query = TaskQuery {
            visible_to: Some(1),
            ..TaskQuery::project(10)
        }
        .with_filter(TaskFilter {
            status: Some(TaskStatus::Done),
            assignee: None,
        });

        assert!(query.matches(&task(1, TaskStatus::Done)));
        assert!(!query.matches(&task(1, TaskStatus::Todo)));
        assert!(!query.matches(&task(2, TaskStatus::Done)));
    }

    #[test]
    fn test_update_condition() {
        let stored = task(5, TaskStatus::Todo);

        let unrestricted = UpdateCondition {
            expected_version: 3,
            assignee: None,
        };
        assert!(unrestricted.holds_for(&stored));

        let stale = UpdateCondition {
            expected_version: 2,
            assignee: None,
        };
        assert!(!stale.holds_for(&stored));

        let wrong_assignee = UpdateCondition {
            expected_version: 3,
            assignee: Some(6),
        };
        assert!(!wrong_assignee.holds_for(&stored));
    }
}
