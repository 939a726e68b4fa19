/// Project model
///
/// Projects are plain containers for tasks. Any authenticated user may
/// create or list them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project identifier
pub type ProjectId = i64;

/// Project record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: ProjectId,

    /// Project name
    pub name: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Project name
    pub name: String,

    /// Optional description
    pub description: Option<String>,
}

impl Project {
    /// Case-insensitive substring match on the project name
    ///
    /// An empty needle matches every project.
    pub fn name_matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches_case_insensitive() {
        let project = Project {
            id: 1,
            name: "Website Redesign".to_string(),
            description: None,
            created_at: Utc::now(),
        };

        assert!(project.name_matches("website"));
        assert!(project.name_matches("REDES"));
        assert!(project.name_matches(""));
        assert!(!project.name_matches("mobile"));
    }
}
