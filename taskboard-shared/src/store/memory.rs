/// In-memory store
///
/// Keeps the three tables in `BTreeMap`s behind a single tokio `RwLock`.
/// Reads share the lock; every write (including the conditional task update)
/// takes it exclusively, which makes the compare-and-swap atomic.
///
/// Enforces the same constraints as the PostgreSQL schema: unique emails and
/// task references to existing projects/users.
///
/// # Example
///
/// ```
/// use taskboard_shared::models::CreateProject;
/// use taskboard_shared::store::{MemoryStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let project = store
///     .create_project(CreateProject {
///         name: "Website Redesign".to_string(),
///         description: None,
///     })
///     .await?;
/// assert_eq!(project.id, 1);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{Store, StoreError, TaskQuery, UpdateCondition};
use crate::models::{
    task::INITIAL_VERSION, CreateProject, CreateTask, CreateUser, Project, ProjectId, Task,
    TaskId, TaskPatch, TaskStatus, User, UserId,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    projects: BTreeMap<ProjectId, Project>,
    tasks: BTreeMap<TaskId, Task>,
}

impl Tables {
    fn next_id<T>(table: &BTreeMap<i64, T>) -> i64 {
        table.keys().next_back().map_or(1, |last| last + 1)
    }
}

/// Store backed by process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|user| user.email == data.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }

        let user = User {
            id: Tables::next_id(&tables.users),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|user| user.email == email).cloned())
    }

    async fn create_project(&self, data: CreateProject) -> Result<Project, StoreError> {
        let mut tables = self.tables.write().await;

        let project = Project {
            id: Tables::next_id(&tables.projects),
            name: data.name,
            description: data.description,
            created_at: Utc::now(),
        };
        tables.projects.insert(project.id, project.clone());

        Ok(project)
    }

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.tables.read().await.projects.get(&id).cloned())
    }

    async fn list_projects(&self, name_contains: Option<&str>) -> Result<Vec<Project>, StoreError> {
        let tables = self.tables.read().await;

        Ok(tables
            .projects
            .values()
            .filter(|project| name_contains.map_or(true, |needle| project.name_matches(needle)))
            .cloned()
            .collect())
    }

    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.projects.contains_key(&data.project_id) {
            return Err(StoreError::MissingReference("project".to_string()));
        }
        if !tables.users.contains_key(&data.assignee_user_id) {
            return Err(StoreError::MissingReference("user".to_string()));
        }

        let task = Task {
            id: Tables::next_id(&tables.tasks),
            project_id: data.project_id,
            title: data.title,
            status: TaskStatus::default(),
            assignee_user_id: data.assignee_user_id,
            due_date: data.due_date,
            created_at: Utc::now(),
            updated_at: None,
            version: INITIAL_VERSION,
        };
        tables.tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn find_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self, query: TaskQuery) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.read().await;

        Ok(tables
            .tasks
            .values()
            .filter(|task| query.matches(task))
            .cloned()
            .collect())
    }

    async fn update_task_if(
        &self,
        id: TaskId,
        condition: UpdateCondition,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.write().await;
        let Tables { users, tasks, .. } = &mut *tables;

        // Condition first, like the WHERE clause of the SQL update
        let Some(task) = tasks.get_mut(&id) else {
            return Ok(None);
        };
        if !condition.holds_for(task) {
            return Ok(None);
        }

        if let Some(assignee) = patch.assignee_user_id {
            if !users.contains_key(&assignee) {
                return Err(StoreError::MissingReference("user".to_string()));
            }
        }

        patch.apply_to(task);
        task.version += 1;
        task.updated_at = Some(Utc::now());

        Ok(Some(task.clone()))
    }
}
