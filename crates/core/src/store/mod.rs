//! The project store capability set.
//!
//! Any backend implementing [`ProjectStore`] is substitutable: the HTTP layer
//! holds an `Arc<dyn ProjectStore>` and never knows which medium is behind
//! it. Backends must enforce project-name and script-id uniqueness at their
//! own write boundary and must re-validate every document they persist.

pub mod memory;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::migration::{MigrationOutcome, MigrationStatus, RollbackOutcome};
use crate::project::{
    NewProject, NewScript, Project, ProjectSummary, Script, UpdateProject, UpdateScript,
};
use crate::types::ProjectId;

pub use memory::MemoryProjectStore;

/// Durable CRUD over projects and their scripts.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Create a project. Seeds one default script when none are supplied.
    async fn create_project(&self, input: NewProject) -> Result<Project, CoreError>;

    async fn get_project_by_id(&self, id: ProjectId) -> Result<Project, CoreError>;

    /// Exact, case-sensitive name lookup.
    async fn get_project_by_name(&self, name: &str) -> Result<Project, CoreError>;

    /// Summaries ordered by `updatedAt`, most recent first.
    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, CoreError>;

    /// Every script id in use across all projects, deduplicated and sorted.
    async fn list_script_ids(&self) -> Result<Vec<String>, CoreError>;

    /// Partial update of name and description.
    async fn update_project(
        &self,
        id: ProjectId,
        input: UpdateProject,
    ) -> Result<Project, CoreError>;

    /// Rename a project. The new name must differ from the current one.
    async fn rename_project(&self, id: ProjectId, new_name: &str) -> Result<Project, CoreError> {
        self.update_project(
            id,
            UpdateProject {
                name: Some(new_name.to_string()),
                description: None,
            },
        )
        .await
    }

    /// Delete a project together with all of its scripts.
    async fn delete_project(&self, id: ProjectId) -> Result<(), CoreError>;

    async fn list_scripts(&self, project_id: ProjectId) -> Result<Vec<Script>, CoreError>;

    async fn get_script(&self, project_id: ProjectId, script_id: &str)
        -> Result<Script, CoreError>;

    async fn add_script(&self, project_id: ProjectId, input: NewScript)
        -> Result<Script, CoreError>;

    async fn update_script(
        &self,
        project_id: ProjectId,
        script_id: &str,
        input: UpdateScript,
    ) -> Result<Script, CoreError>;

    /// Remove one script. Does not enforce that a script remains.
    async fn delete_script(&self, project_id: ProjectId, script_id: &str)
        -> Result<(), CoreError>;

    /// Rewrite every legacy record into the multi-script shape, all or nothing.
    async fn migrate_legacy(&self) -> Result<MigrationOutcome, CoreError>;

    /// Restore the legacy shape from each project's first script. Lossy.
    async fn rollback_migration(&self) -> Result<RollbackOutcome, CoreError>;

    async fn migration_status(&self) -> Result<MigrationStatus, CoreError>;

    /// Whether the backing medium is reachable.
    async fn health_check(&self) -> Result<(), CoreError>;
}
