/// Database models for Taskboard
///
/// # Models
///
/// - `user`: User accounts and roles
/// - `project`: Projects grouping tasks
/// - `task`: Tasks with optimistic-concurrency versioning
///
/// Persistence lives behind [`crate::store::Store`]; these are plain records.

pub mod project;
pub mod task;
pub mod user;

pub use project::{CreateProject, Project, ProjectId};
pub use task::{CreateTask, Task, TaskFilter, TaskId, TaskPatch, TaskStatus};
pub use user::{CreateUser, Role, User, UserId};
