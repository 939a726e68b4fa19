/// Task endpoints
///
/// All endpoints require authentication. What a caller sees and may change
/// is decided by [`Access`]: admins act on every task, members only on tasks
/// assigned to them.
///
/// # Endpoints
///
/// - `GET /projects/:id/tasks?status=&assignee=` - List tasks (role-scoped)
/// - `POST /projects/:id/tasks` - Create task assigned to the caller
/// - `PATCH /tasks/:id` - Update task with optimistic locking
///
/// # Optimistic Locking
///
/// `PATCH` needs the version the client last saw, either as an `If-Match`
/// header (`3`, `"3"` or `W/"3"`) or as a `version` body field. The header
/// wins when both are sent. A stale version yields `409 Conflict`; the
/// client should re-fetch and retry. Successful updates return the new
/// version in an `ETag` header.

use crate::{
    app::{AppState, CurrentUser},
    error::{validation_errors, ApiError, ApiResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskboard_shared::{
    auth::policy::Access,
    concurrency::{self, ExpectedVersion, VersionError},
    models::{
        task::deserialize_some, CreateTask, ProjectId, Task, TaskFilter, TaskId, TaskPatch,
        TaskStatus, UserId,
    },
};
use validator::Validate;

/// Task listing query parameters
///
/// Kept as raw strings so an empty `status=` means "no filter" and a bad
/// value is reported as `400` with a useful message.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListParams {
    /// `todo`, `in_progress` or `done`
    pub status: Option<String>,

    /// Assignee user ID
    pub assignee: Option<String>,
}

impl TaskListParams {
    /// Parses into a typed filter
    pub fn into_filter(self) -> Result<TaskFilter, ApiError> {
        let status = non_empty(self.status)
            .map(|raw| raw.parse::<TaskStatus>())
            .transpose()
            .map_err(ApiError::BadRequest)?;

        let assignee = non_empty(self.assignee)
            .map(|raw| raw.parse::<UserId>())
            .transpose()
            .map_err(|_| ApiError::BadRequest("assignee must be a user id".to_string()))?;

        Ok(TaskFilter { status, assignee })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Optional due date (ISO 8601)
    pub due_date: Option<DateTime<Utc>>,
}

/// Update task request
///
/// Absent fields are left unchanged; `"due_date": null` clears the due date.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New assignee (ignored for members)
    pub assignee_user_id: Option<UserId>,

    /// New due date, or null to clear
    #[serde(default, deserialize_with = "deserialize_some")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    /// Expected version when no `If-Match` header is sent
    pub version: Option<i64>,
}

impl UpdateTaskRequest {
    fn into_patch(self) -> TaskPatch {
        TaskPatch {
            title: self.title,
            status: self.status,
            assignee_user_id: self.assignee_user_id,
            due_date: self.due_date,
        }
    }
}

async fn require_project(state: &AppState, project_id: ProjectId) -> ApiResult<()> {
    match state.store.find_project(project_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("Project not found".to_string())),
    }
}

/// List tasks in a project
///
/// Members only see tasks assigned to them; `status` and `assignee`
/// narrow the result further.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown status or non-numeric assignee
/// - `404 Not Found`: Project does not exist
pub async fn list_tasks(
    State(state): State<AppState>,
    path: Result<Path<ProjectId>, PathRejection>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    query: Result<Query<TaskListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    let Path(project_id) = path?;
    let Query(params) = query?;
    let filter = params.into_filter()?;

    require_project(&state, project_id).await?;

    let scope = Access::for_user(&user).scope(project_id, filter);
    let tasks = state.store.list_tasks(scope).await?;

    tracing::debug!(
        user_id = user.id,
        project_id,
        count = tasks.len(),
        "Listed tasks"
    );

    Ok(Json(tasks))
}

/// Create a task
///
/// The caller becomes the assignee. New tasks start as `todo` at version 1.
///
/// # Errors
///
/// - `404 Not Found`: Project does not exist
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    path: Result<Path<ProjectId>, PathRejection>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Path(project_id) = path?;
    let Json(req) = payload?;
    req.validate().map_err(validation_errors)?;

    require_project(&state, project_id).await?;

    let task = state
        .store
        .create_task(CreateTask {
            project_id,
            title: req.title,
            assignee_user_id: user.id,
            due_date: req.due_date,
        })
        .await?;

    tracing::info!(user_id = user.id, project_id, task_id = task.id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Update a task
///
/// # Endpoint
///
/// ```text
/// PATCH /tasks/2
/// Authorization: Bearer <token>
/// If-Match: "1"
/// Content-Type: application/json
///
/// {
///   "status": "done",
///   "assignee_user_id": 3
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing/invalid version, unknown assignee, malformed JSON
/// - `403 Forbidden`: Member updating a task not assigned to them
/// - `404 Not Found`: Task does not exist
/// - `409 Conflict`: Version is stale
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update_task(
    State(state): State<AppState>,
    path: Result<Path<TaskId>, PathRejection>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    headers: HeaderMap,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(task_id) = path?;
    let Json(req) = payload?;
    req.validate().map_err(validation_errors)?;

    let if_match = match headers.get(header::IF_MATCH) {
        Some(value) => Some(value.to_str().map_err(|_| VersionError::InvalidHeader)?),
        None => None,
    };
    let expected = ExpectedVersion::resolve(if_match, req.version)?;

    let task =
        concurrency::update_task(state.store.as_ref(), &user, task_id, expected, req.into_patch())
            .await?;

    let etag = format!("\"{}\"", task.version);
    Ok(([(header::ETAG, etag)], Json(task)))
}
