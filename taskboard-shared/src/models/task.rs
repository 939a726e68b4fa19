/// Task model
///
/// Tasks belong to a project and are assigned to exactly one user. Every
/// successful mutation bumps `version` by one; writers must present the
/// version they read (see [`crate::concurrency`]).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'done');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT NOT NULL REFERENCES projects(id),
///     title VARCHAR(255) NOT NULL,
///     status task_status NOT NULL DEFAULT 'todo',
///     assignee_user_id BIGINT NOT NULL REFERENCES users(id),
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ,
///     version BIGINT NOT NULL DEFAULT 1
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use super::{project::ProjectId, user::UserId};

/// Task identifier
pub type TaskId = i64;

/// Version every task starts at
pub const INITIAL_VERSION: i64 = 1;

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    Todo,

    /// Being worked on
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Converts status to its wire/database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!("Unknown task status: {}", other)),
        }
    }
}

/// Task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: TaskId,

    /// Owning project
    pub project_id: ProjectId,

    /// Short title
    pub title: String,

    /// Workflow status
    pub status: TaskStatus,

    /// User the task is assigned to
    pub assignee_user_id: UserId,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last mutated (None until the first update)
    pub updated_at: Option<DateTime<Utc>>,

    /// Optimistic concurrency counter, starts at 1
    pub version: i64,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Owning project (must exist)
    pub project_id: ProjectId,

    /// Title
    pub title: String,

    /// Initial assignee, normally the creator
    pub assignee_user_id: UserId,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,
}

/// Field changes for a task update
///
/// Every field is presence-aware: `None` leaves the stored value untouched.
/// `due_date` is nullable, so `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    /// New title
    pub title: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New assignee (admins only, see [`crate::auth::policy::Access`])
    pub assignee_user_id: Option<UserId>,

    /// New due date (use Some(None) to clear)
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.status.is_none()
            && self.assignee_user_id.is_none()
            && self.due_date.is_none()
    }

    /// Applies the patch to a task in place
    ///
    /// Does not touch `version` or `updated_at`; the store owns those.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(assignee) = self.assignee_user_id {
            task.assignee_user_id = assignee;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }
}

/// Caller-supplied listing filters
///
/// Applied after the role scope, as an intersection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks in this status
    pub status: Option<TaskStatus>,

    /// Only tasks assigned to this user
    pub assignee: Option<UserId>,
}

/// Deserializes a present field into `Some(value)`
///
/// Combined with `#[serde(default)]` this distinguishes an absent field
/// (`None`) from an explicit `null` (`Some(None)`).
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            id: 1,
            project_id: 1,
            title: "Design homepage".to_string(),
            status: TaskStatus::Todo,
            assignee_user_id: 2,
            due_date: None,
            created_at: Utc::now(),
            updated_at: None,
            version: INITIAL_VERSION,
        }
    }

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Todo.as_str(), "todo");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Done.as_str(), "done");
    }

    #[test]
    fn test_task_status_from_str() {
        assert_eq!("in_progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert!("IN_PROGRESS".parse::<TaskStatus>().is_err());
        assert!("blocked".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_task_status_serde() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert!(serde_json::from_str::<TaskStatus>("\"archived\"").is_err());
    }

    #[test]
    fn test_empty_patch() {
        let patch = TaskPatch::default();
        assert!(patch.is_empty());

        let mut task = sample_task();
        let before = task.clone();
        patch.apply_to(&mut task);
        assert_eq!(task, before);
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut task = sample_task();
        let patch = TaskPatch {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };

        patch.apply_to(&mut task);

        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.title, "Design homepage");
        assert_eq!(task.assignee_user_id, 2);
        assert_eq!(task.version, INITIAL_VERSION);
    }

    #[test]
    fn test_patch_clears_due_date() {
        let mut task = sample_task();
        task.due_date = Some(Utc::now());

        let patch = TaskPatch {
            due_date: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());

        patch.apply_to(&mut task);
        assert!(task.due_date.is_none());
    }

    #[test]
    fn test_deserialize_some_distinguishes_null_from_absent() {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(default, deserialize_with = "deserialize_some")]
            due_date: Option<Option<DateTime<Utc>>>,
        }

        let absent: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.due_date, None);

        let null: Probe = serde_json::from_str(r#"{"due_date": null}"#).unwrap();
        assert_eq!(null.due_date, Some(None));

        let set: Probe = serde_json::from_str(r#"{"due_date": "2030-01-01T00:00:00Z"}"#).unwrap();
        assert!(matches!(set.due_date, Some(Some(_))));
    }
}
