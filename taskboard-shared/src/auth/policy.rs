/// Role-based access control
///
/// # Permission Model
///
/// Each authenticated user maps to exactly one [`Access`] capability:
///
/// | Role   | Access                 | Sees          | Updates       | Reassigns |
/// |--------|------------------------|---------------|---------------|-----------|
/// | ADMIN  | `Unrestricted`         | every task    | every task    | yes       |
/// | MEMBER | `AssignedOnly(self)`   | own tasks     | own tasks     | no        |
///
/// Handlers never branch on [`Role`](crate::models::Role) directly; they ask
/// the capability to scope a listing, authorize an update, or strip fields a
/// member may not change.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::policy::Access;
/// use taskboard_shared::models::{TaskFilter, TaskPatch};
///
/// let member = Access::AssignedOnly(7);
///
/// // Members only ever list their own tasks
/// let query = member.scope(1, TaskFilter::default());
/// assert_eq!(query.visible_to, Some(7));
///
/// // ... and cannot reassign
/// let patch = member.restrict_patch(TaskPatch {
///     assignee_user_id: Some(8),
///     ..Default::default()
/// });
/// assert!(patch.assignee_user_id.is_none());
/// ```

use crate::models::{ProjectId, Role, Task, TaskFilter, TaskPatch, User, UserId};
use crate::store::{TaskQuery, UpdateCondition};

/// Error type for authorization checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller may not act on this resource
    #[error("Not authorized to modify this task")]
    Forbidden,
}

/// What a user is allowed to touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Every task in every project
    Unrestricted,

    /// Only tasks currently assigned to this user
    AssignedOnly(UserId),
}

impl Access {
    /// Derives the capability from a user's role
    pub fn for_user(user: &User) -> Self {
        match user.role {
            Role::Admin => Access::Unrestricted,
            Role::Member => Access::AssignedOnly(user.id),
        }
    }

    /// Whether the task is visible (and therefore editable) under this access
    pub fn can_see(&self, task: &Task) -> bool {
        match self {
            Access::Unrestricted => true,
            Access::AssignedOnly(user_id) => task.assignee_user_id == *user_id,
        }
    }

    /// Builds a listing query: role scope AND caller filters
    pub fn scope(&self, project_id: ProjectId, filter: TaskFilter) -> TaskQuery {
        TaskQuery {
            visible_to: self.assigned_to(),
            ..TaskQuery::project(project_id)
        }
        .with_filter(filter)
    }

    /// Checks that the caller may update `task`
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::Forbidden` when a member targets a task assigned
    /// to someone else.
    pub fn authorize_update(&self, task: &Task) -> Result<(), AuthzError> {
        if self.can_see(task) {
            Ok(())
        } else {
            Err(AuthzError::Forbidden)
        }
    }

    /// Whether the caller may change a task's assignee
    pub fn may_reassign(&self) -> bool {
        matches!(self, Access::Unrestricted)
    }

    /// Drops fields the caller may not change
    ///
    /// A member's `assignee_user_id` is discarded silently; the rest of the
    /// patch still applies.
    pub fn restrict_patch(&self, mut patch: TaskPatch) -> TaskPatch {
        if !self.may_reassign() && patch.assignee_user_id.take().is_some() {
            tracing::debug!("Ignoring reassignment from non-admin caller");
        }
        patch
    }

    /// Store precondition for an update at `expected_version`
    ///
    /// Members also require that they are still the assignee when the write
    /// lands.
    pub fn update_condition(&self, expected_version: i64) -> UpdateCondition {
        UpdateCondition {
            expected_version,
            assignee: self.assigned_to(),
        }
    }

    fn assigned_to(&self) -> Option<UserId> {
        match self {
            Access::Unrestricted => None,
            Access::AssignedOnly(user_id) => Some(*user_id),
        }
    }
}
