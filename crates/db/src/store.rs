//! [`ProjectStore`] backed by Postgres.
//!
//! Name uniqueness comes from the `uq_projects_name` constraint. Script
//! edits take the project's row lock for the read-modify-write of its
//! document, and the migration passes lock every row in one transaction.

use std::collections::BTreeSet;

use addata_core::error::CoreError;
use addata_core::migration::{
    decode_project_data, migration_status, plan_migration, raw_script_ids, rollback_record,
    MigrationOutcome, MigrationStatus, RollbackOutcome,
};
use addata_core::project::{
    NewProject, NewScript, Project, ProjectData, ProjectSummary, Script, UpdateProject,
    UpdateScript,
};
use addata_core::store::ProjectStore;
use addata_core::types::ProjectId;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgConnection;

use crate::models::project::ProjectRow;
use crate::repositories::{MigrationRepo, ProjectRepo};
use crate::DbPool;

/// Name of the unique constraint guarding project names.
const NAME_CONSTRAINT: &str = "uq_projects_name";

#[derive(Debug, Clone)]
pub struct PgProjectStore {
    pool: DbPool,
}

impl PgProjectStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Lock a project row, apply `edit` to its decoded document, and write the
    /// result back in the same transaction. Nothing is written if `edit`
    /// fails.
    async fn edit_scripts<T, F>(
        &self,
        operation: &'static str,
        project_id: ProjectId,
        edit: F,
    ) -> Result<T, CoreError>
    where
        T: Send,
        F: FnOnce(&mut ProjectData) -> Result<T, CoreError> + Send,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error(operation, Some(project_id), e))?;

        let row = ProjectRepo::find_by_id_for_update(&mut *tx, project_id)
            .await
            .map_err(|e| storage_error(operation, Some(project_id), e))?
            .ok_or_else(|| CoreError::project_not_found(project_id))?;

        let mut data = decode_project_data(&row.stored())?;
        let result = edit(&mut data)?;
        write_data(&mut *tx, operation, project_id, &data).await?;

        tx.commit()
            .await
            .map_err(|e| storage_error(operation, Some(project_id), e))?;
        Ok(result)
    }
}

/// Log a database failure with its context and convert it to
/// [`CoreError::Storage`].
fn storage_error(
    operation: &'static str,
    project_id: Option<ProjectId>,
    err: sqlx::Error,
) -> CoreError {
    match project_id {
        Some(project_id) => {
            tracing::error!(operation, %project_id, error = %err, "Project store query failed")
        }
        None => tracing::error!(operation, error = %err, "Project store query failed"),
    }
    CoreError::Storage(format!("{operation} failed: {err}"))
}

/// Map a unique violation on the name constraint to [`CoreError::DuplicateName`].
fn name_error(
    operation: &'static str,
    project_id: Option<ProjectId>,
    name: &str,
    err: sqlx::Error,
) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") && db_err.constraint() == Some(NAME_CONSTRAINT)
        {
            return CoreError::DuplicateName(name.to_string());
        }
    }
    storage_error(operation, project_id, err)
}

fn encode(data: &ProjectData) -> Result<Value, CoreError> {
    serde_json::to_value(data)
        .map_err(|e| CoreError::Internal(format!("Failed to encode project data: {e}")))
}

async fn write_data(
    conn: &mut PgConnection,
    operation: &'static str,
    project_id: ProjectId,
    data: &ProjectData,
) -> Result<(), CoreError> {
    let doc = encode(data)?;
    let updated = ProjectRepo::replace_data(conn, project_id, &doc)
        .await
        .map_err(|e| storage_error(operation, Some(project_id), e))?;
    if updated {
        Ok(())
    } else {
        Err(CoreError::project_not_found(project_id))
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn create_project(&self, input: NewProject) -> Result<Project, CoreError> {
        let id = uuid::Uuid::new_v4();
        let prepared = input.prepare(id)?;
        let doc = encode(&prepared.data)?;

        let row = ProjectRepo::create(
            &self.pool,
            id,
            &prepared.name,
            prepared.description.as_deref(),
            &doc,
        )
        .await
        .map_err(|e| name_error("create_project", None, &prepared.name, e))?;

        tracing::info!(project_id = %id, name = %row.name, "Project created");
        row.into_project()
    }

    async fn get_project_by_id(&self, id: ProjectId) -> Result<Project, CoreError> {
        ProjectRepo::find_by_id(&self.pool, id)
            .await
            .map_err(|e| storage_error("get_project_by_id", Some(id), e))?
            .ok_or_else(|| CoreError::project_not_found(id))?
            .into_project()
    }

    async fn get_project_by_name(&self, name: &str) -> Result<Project, CoreError> {
        ProjectRepo::find_by_name(&self.pool, name)
            .await
            .map_err(|e| storage_error("get_project_by_name", None, e))?
            .ok_or_else(|| CoreError::project_name_not_found(name))?
            .into_project()
    }

    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, CoreError> {
        let rows = ProjectRepo::list(&self.pool)
            .await
            .map_err(|e| storage_error("list_projects", None, e))?;
        Ok(rows.iter().map(ProjectRow::summary).collect())
    }

    async fn list_script_ids(&self) -> Result<Vec<String>, CoreError> {
        let rows = ProjectRepo::list(&self.pool)
            .await
            .map_err(|e| storage_error("list_script_ids", None, e))?;
        let mut ids = BTreeSet::new();
        for row in &rows {
            match raw_script_ids(&row.stored()) {
                Ok(row_ids) => ids.extend(row_ids),
                Err(e) => tracing::warn!(project_id = %row.id, error = %e, "Skipping unreadable project"),
            }
        }
        Ok(ids.into_iter().collect())
    }

    async fn update_project(
        &self,
        id: ProjectId,
        input: UpdateProject,
    ) -> Result<Project, CoreError> {
        let current = self.get_project_by_id(id).await?;
        let update = input.prepare(&current)?;

        let row = ProjectRepo::update(
            &self.pool,
            id,
            update.name.as_deref(),
            update.description.as_deref(),
        )
        .await
        .map_err(|e| {
            let name = update.name.as_deref().unwrap_or(&current.name);
            name_error("update_project", Some(id), name, e)
        })?
        .ok_or_else(|| CoreError::project_not_found(id))?;

        tracing::info!(project_id = %id, name = %row.name, "Project updated");
        row.into_project()
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), CoreError> {
        let deleted = ProjectRepo::delete(&self.pool, id)
            .await
            .map_err(|e| storage_error("delete_project", Some(id), e))?;
        if !deleted {
            return Err(CoreError::project_not_found(id));
        }
        tracing::info!(project_id = %id, "Project deleted");
        Ok(())
    }

    async fn list_scripts(&self, project_id: ProjectId) -> Result<Vec<Script>, CoreError> {
        Ok(self.get_project_by_id(project_id).await?.data.scripts)
    }

    async fn get_script(
        &self,
        project_id: ProjectId,
        script_id: &str,
    ) -> Result<Script, CoreError> {
        self.get_project_by_id(project_id)
            .await?
            .data
            .find(script_id)
            .cloned()
            .ok_or_else(|| CoreError::script_not_found(script_id))
    }

    async fn add_script(
        &self,
        project_id: ProjectId,
        input: NewScript,
    ) -> Result<Script, CoreError> {
        let script = input.into_script()?;
        self.edit_scripts("add_script", project_id, move |data| {
            if data.find(&script.script_id).is_some() {
                return Err(CoreError::DuplicateScriptId {
                    project_id,
                    script_id: script.script_id,
                });
            }
            data.scripts.push(script.clone());
            Ok(script)
        })
        .await
    }

    async fn update_script(
        &self,
        project_id: ProjectId,
        script_id: &str,
        input: UpdateScript,
    ) -> Result<Script, CoreError> {
        self.edit_scripts("update_script", project_id, move |data| {
            let index = data
                .position(script_id)
                .ok_or_else(|| CoreError::script_not_found(script_id))?;
            let updated = input.apply_to(&data.scripts[index])?;
            data.scripts[index] = updated.clone();
            Ok(updated)
        })
        .await
    }

    async fn delete_script(&self, project_id: ProjectId, script_id: &str) -> Result<(), CoreError> {
        self.edit_scripts("delete_script", project_id, move |data| {
            let index = data
                .position(script_id)
                .ok_or_else(|| CoreError::script_not_found(script_id))?;
            data.scripts.remove(index);
            Ok(())
        })
        .await
    }

    async fn migrate_legacy(&self) -> Result<MigrationOutcome, CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("migrate_legacy", None, e))?;

        let rows = MigrationRepo::lock_all(&mut *tx)
            .await
            .map_err(|e| storage_error("migrate_legacy", None, e))?;
        let records: Vec<_> = rows.iter().map(ProjectRow::stored).collect();

        // Any malformed record fails planning before a single row is written.
        let plan = plan_migration(&records)?;
        for (project_id, data) in &plan.updates {
            write_data(&mut *tx, "migrate_legacy", *project_id, data).await?;
        }

        tx.commit()
            .await
            .map_err(|e| storage_error("migrate_legacy", None, e))?;

        let outcome = plan.outcome();
        tracing::info!(
            migrated = outcome.migrated,
            skipped = outcome.skipped,
            "Legacy project migration complete"
        );
        Ok(outcome)
    }

    async fn rollback_migration(&self) -> Result<RollbackOutcome, CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("rollback_migration", None, e))?;

        let rows = MigrationRepo::lock_all(&mut *tx)
            .await
            .map_err(|e| storage_error("rollback_migration", None, e))?;

        let mut restores = Vec::new();
        for row in &rows {
            if let Some(legacy) = rollback_record(&row.stored())? {
                restores.push((row.id, legacy));
            }
        }
        for (project_id, (script_id, data)) in &restores {
            MigrationRepo::restore_legacy(&mut *tx, *project_id, script_id, data)
                .await
                .map_err(|e| storage_error("rollback_migration", Some(*project_id), e))?;
        }

        tx.commit()
            .await
            .map_err(|e| storage_error("rollback_migration", None, e))?;

        let outcome = RollbackOutcome {
            rolled_back: restores.len(),
            total: rows.len(),
        };
        tracing::warn!(rolled_back = outcome.rolled_back, "Project migration rolled back");
        Ok(outcome)
    }

    async fn migration_status(&self) -> Result<MigrationStatus, CoreError> {
        let rows = MigrationRepo::list_all(&self.pool)
            .await
            .map_err(|e| storage_error("migration_status", None, e))?;
        let records: Vec<_> = rows.iter().map(ProjectRow::stored).collect();
        Ok(migration_status(&records))
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool)
            .await
            .map_err(|e| storage_error("health_check", None, e))
    }
}
