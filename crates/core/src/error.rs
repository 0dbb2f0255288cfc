use crate::types::ProjectId;

/// Domain error taxonomy shared by every store backend and the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// One or more input fields are malformed. Every offending field is listed.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Project name already exists: {0}")]
    DuplicateName(String),

    #[error("Script '{script_id}' already exists in project {project_id}")]
    DuplicateScriptId {
        project_id: ProjectId,
        script_id: String,
    },

    /// An application-level rule refused the operation (e.g. deleting the last script).
    #[error("Policy violation: {0}")]
    Policy(String),

    /// I/O or transaction failure in the backing store.
    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Build a validation error carrying a single message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    pub fn project_not_found(id: ProjectId) -> Self {
        Self::NotFound {
            entity: "Project",
            id: id.to_string(),
        }
    }

    pub fn project_name_not_found(name: &str) -> Self {
        Self::NotFound {
            entity: "Project",
            id: name.to_string(),
        }
    }

    pub fn script_not_found(script_id: &str) -> Self {
        Self::NotFound {
            entity: "Script",
            id: script_id.to_string(),
        }
    }
}
