/// Project endpoints
///
/// All endpoints require authentication. Projects are visible to every
/// authenticated user; any user may create one.
///
/// # Endpoints
///
/// - `GET /projects?q=` - List projects, optionally filtered by name
/// - `POST /projects` - Create project

use crate::{
    app::{AppState, CurrentUser},
    error::{validation_errors, ApiResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::models::{CreateProject, Project};
use validator::Validate;

/// Project search parameters
#[derive(Debug, Default, Deserialize)]
pub struct ProjectSearch {
    /// Case-insensitive substring of the project name
    pub q: Option<String>,
}

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Optional description
    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,
}

/// List projects
///
/// # Endpoint
///
/// ```text
/// GET /projects?q=web
/// Authorization: Bearer <token>
/// ```
///
/// Returns projects ordered by ID. An empty `q` lists everything.
pub async fn list_projects(
    State(state): State<AppState>,
    query: Result<Query<ProjectSearch>, QueryRejection>,
) -> ApiResult<Json<Vec<Project>>> {
    let Query(search) = query?;
    let needle = search.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let projects = state.store.list_projects(needle).await?;

    Ok(Json(projects))
}

/// Create project
///
/// # Endpoint
///
/// ```text
/// POST /projects
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// {
///   "name": "Website Redesign",
///   "description": "Complete overhaul of company website"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed JSON
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let Json(req) = payload?;
    req.validate().map_err(validation_errors)?;

    let project = state
        .store
        .create_project(CreateProject {
            name: req.name,
            description: req.description,
        })
        .await?;

    tracing::info!(user_id = user.id, project_id = project.id, "Project created");

    Ok((StatusCode::CREATED, Json(project)))
}
