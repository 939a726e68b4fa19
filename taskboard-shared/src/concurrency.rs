/// Optimistic concurrency control for task updates
///
/// Every task carries a `version` that starts at 1 and grows by one on each
/// successful update. A writer states the version it last read; the update
/// lands only if the stored version still matches, otherwise the writer gets
/// [`UpdateError::Conflict`] and must re-read.
///
/// # Flow
///
/// 1. Load the task (`NotFound` if absent)
/// 2. Authorize against the caller's [`Access`] (`Forbidden`)
/// 3. Strip fields the caller may not change
/// 4. Compare-and-swap through [`Store::update_task_if`]
/// 5. If nothing matched, re-read to report `NotFound`, `Forbidden` or
///    `Conflict`
///
/// The version check happens inside the store, so the window between step 1
/// and step 4 cannot let a stale write through.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::concurrency::{update_task, ExpectedVersion};
/// use taskboard_shared::models::{TaskPatch, TaskStatus, User};
/// use taskboard_shared::store::Store;
///
/// # async fn example(store: &dyn Store, user: &User) -> Result<(), Box<dyn std::error::Error>> {
/// let expected = ExpectedVersion::resolve(Some("\"3\""), None)?;
/// let patch = TaskPatch {
///     status: Some(TaskStatus::Done),
///     ..Default::default()
/// };
///
/// let task = update_task(store, user, 2, expected, patch).await?;
/// assert_eq!(task.version, 4);
/// # Ok(())
/// # }
/// ```

use crate::auth::policy::{Access, AuthzError};
use crate::models::{Task, TaskId, TaskPatch, User};
use crate::store::{Store, StoreError};

/// Error type for resolving the expected version
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// Neither `If-Match` nor a body `version` was supplied
    #[error("Expected version required: send an If-Match header or a version field")]
    Missing,

    /// `If-Match` is present but not a version number
    #[error("Invalid If-Match header: expected a version number")]
    InvalidHeader,
}

/// Version the writer believes is current
pub struct ExpectedVersion;

impl ExpectedVersion {
    /// Picks the expected version from the `If-Match` header or request body
    ///
    /// The header wins whenever it is present. It may be a bare integer, a
    /// quoted integer (`"3"`), or a weak tag (`W/"3"`). An unparseable header
    /// is an error even if the body carries a version.
    ///
    /// # Errors
    ///
    /// - `VersionError::InvalidHeader` if the header cannot be parsed
    /// - `VersionError::Missing` if neither source is present
    pub fn resolve(header: Option<&str>, body: Option<i64>) -> Result<i64, VersionError> {
        let Some(raw) = header else {
            return body.ok_or(VersionError::Missing);
        };

        let version = Self::parse_if_match(raw)?;

        if let Some(body_version) = body {
            if body_version != version {
                tracing::debug!(
                    header_version = version,
                    body_version,
                    "If-Match and body version disagree, using If-Match"
                );
            }
        }

        Ok(version)
    }

    fn parse_if_match(raw: &str) -> Result<i64, VersionError> {
        let tag = raw.trim();
        let tag = tag.strip_prefix("W/").unwrap_or(tag);

        let bare = match tag.strip_prefix('"') {
            Some(rest) => rest.strip_suffix('"').ok_or(VersionError::InvalidHeader)?,
            None => tag,
        };

        bare.parse().map_err(|_| VersionError::InvalidHeader)
    }
}

/// Error type for task updates
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// Task does not exist
    #[error("Task not found")]
    NotFound,

    /// Caller may not modify the task
    #[error("Not authorized to modify this task")]
    Forbidden,

    /// Stored version moved on since the caller read it
    #[error("Version conflict: expected {expected}, current is {current}")]
    Conflict { expected: i64, current: i64 },

    /// The requested new assignee does not exist
    #[error("Assignee does not exist")]
    InvalidAssignee,

    /// Underlying store failure
    #[error(transparent)]
    Store(StoreError),
}

impl From<AuthzError> for UpdateError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden => UpdateError::Forbidden,
        }
    }
}

impl From<StoreError> for UpdateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingReference(_) => UpdateError::InvalidAssignee,
            other => UpdateError::Store(other),
        }
    }
}

/// Applies `patch` to a task if it is still at `expected_version`
///
/// On success the returned task has `version == expected_version + 1`. On any
/// error nothing was written.
///
/// # Errors
///
/// See [`UpdateError`].
pub async fn update_task(
    store: &dyn Store,
    user: &User,
    task_id: TaskId,
    expected_version: i64,
    patch: TaskPatch,
) -> Result<Task, UpdateError> {
    let access = Access::for_user(user);

    let task = store.find_task(task_id).await?.ok_or(UpdateError::NotFound)?;
    access.authorize_update(&task).map_err(|e| {
        tracing::info!(user_id = user.id, task_id, "Update rejected: not assignee");
        e
    })?;

    let patch = access.restrict_patch(patch);
    if patch.is_empty() {
        tracing::debug!(user_id = user.id, task_id, "Empty patch, bumping version only");
    }
    let condition = access.update_condition(expected_version);

    if let Some(updated) = store.update_task_if(task_id, condition, &patch).await? {
        tracing::info!(
            user_id = user.id,
            task_id,
            version = updated.version,
            "Task updated"
        );
        return Ok(updated);
    }

    // Nothing matched: find out which precondition broke
    let current = store.find_task(task_id).await?.ok_or(UpdateError::NotFound)?;
    access.authorize_update(&current)?;

    tracing::info!(
        user_id = user.id,
        task_id,
        expected = expected_version,
        current = current.version,
        "Version conflict"
    );
    Err(UpdateError::Conflict {
        expected: expected_version,
        current: current.version,
    })
}
