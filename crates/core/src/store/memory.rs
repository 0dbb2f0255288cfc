//! In-process [`ProjectStore`] backend.
//!
//! Stands in for the browser local-storage variant of the tool and backs the
//! HTTP integration tests. Records are kept in the same raw shape the
//! database uses (a JSON `data` document plus the legacy `scriptId` column),
//! so the migration procedure behaves identically here. Every mutation runs
//! under a single write guard, which is what makes the uniqueness checks
//! race-free.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::migration::{
    decode_project_data, migration_status, plan_migration, raw_script_count, raw_script_ids,
    rollback_record, MigrationOutcome, MigrationStatus, RollbackOutcome, StoredRecord,
};
use crate::project::{
    NewProject, NewScript, Project, ProjectData, ProjectSummary, Script, UpdateProject,
    UpdateScript,
};
use crate::store::ProjectStore;
use crate::types::{ProjectId, Timestamp};

#[derive(Debug, Clone)]
struct Row {
    id: ProjectId,
    name: String,
    description: Option<String>,
    script_id: Option<String>,
    data: Value,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Row {
    fn stored(&self) -> StoredRecord {
        StoredRecord {
            id: self.id,
            name: self.name.clone(),
            script_id: self.script_id.clone(),
            data: self.data.clone(),
        }
    }

    fn to_project(&self) -> Result<Project, CoreError> {
        Ok(Project {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            data: decode_project_data(&self.stored())?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    /// Listing view read from the raw document, so a row whose AdData no
    /// longer decodes still shows up.
    fn summary(&self) -> ProjectSummary {
        let script_count = raw_script_count(&self.data);
        ProjectSummary {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            script_count,
            has_data: script_count > 0,
        }
    }

    /// Replace the document with `data`, clearing any legacy script id.
    fn write_data(&mut self, data: &ProjectData) -> Result<(), CoreError> {
        self.data = serde_json::to_value(data)
            .map_err(|e| CoreError::Internal(format!("Failed to encode project data: {e}")))?;
        self.script_id = None;
        self.updated_at = chrono::Utc::now();
        Ok(())
    }
}

/// A [`ProjectStore`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    rows: RwLock<HashMap<ProjectId, Row>>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record in the legacy single-script shape, bypassing
    /// validation. Used to load data saved by older versions of the tool.
    pub async fn insert_legacy(
        &self,
        name: &str,
        script_id: Option<&str>,
        data: Value,
    ) -> Result<ProjectId, CoreError> {
        let mut rows = self.rows.write().await;
        if rows.values().any(|r| r.name == name) {
            return Err(CoreError::DuplicateName(name.to_string()));
        }
        let now = chrono::Utc::now();
        let id = uuid::Uuid::new_v4();
        rows.insert(
            id,
            Row {
                id,
                name: name.to_string(),
                description: None,
                script_id: script_id.map(str::to_string),
                data,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    /// The raw stored record for `id`, as the migration procedure sees it.
    pub async fn stored_record(&self, id: ProjectId) -> Option<StoredRecord> {
        self.rows.read().await.get(&id).map(Row::stored)
    }
}

fn row_mut(rows: &mut HashMap<ProjectId, Row>, id: ProjectId) -> Result<&mut Row, CoreError> {
    rows.get_mut(&id)
        .ok_or_else(|| CoreError::project_not_found(id))
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn create_project(&self, input: NewProject) -> Result<Project, CoreError> {
        let id = uuid::Uuid::new_v4();
        let prepared = input.prepare(id)?;

        let mut rows = self.rows.write().await;
        if rows.values().any(|r| r.name == prepared.name) {
            return Err(CoreError::DuplicateName(prepared.name));
        }

        let now = chrono::Utc::now();
        let mut row = Row {
            id,
            name: prepared.name,
            description: prepared.description,
            script_id: None,
            data: Value::Null,
            created_at: now,
            updated_at: now,
        };
        row.write_data(&prepared.data)?;
        row.updated_at = now;
        let project = row.to_project()?;
        rows.insert(id, row);

        tracing::debug!(project_id = %id, name = %project.name, "Project created");
        Ok(project)
    }

    async fn get_project_by_id(&self, id: ProjectId) -> Result<Project, CoreError> {
        let rows = self.rows.read().await;
        rows.get(&id)
            .ok_or_else(|| CoreError::project_not_found(id))?
            .to_project()
    }

    async fn get_project_by_name(&self, name: &str) -> Result<Project, CoreError> {
        let rows = self.rows.read().await;
        rows.values()
            .find(|r| r.name == name)
            .ok_or_else(|| CoreError::project_name_not_found(name))?
            .to_project()
    }

    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, CoreError> {
        let rows = self.rows.read().await;
        let mut summaries: Vec<ProjectSummary> = rows.values().map(Row::summary).collect();
        summaries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(summaries)
    }

    async fn list_script_ids(&self) -> Result<Vec<String>, CoreError> {
        let rows = self.rows.read().await;
        let mut ids = BTreeSet::new();
        for row in rows.values() {
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
        let mut rows = self.rows.write().await;
        let current = rows
            .get(&id)
            .ok_or_else(|| CoreError::project_not_found(id))?
            .to_project()?;
        let update = input.prepare(&current)?;

        if let Some(name) = &update.name {
            if rows.values().any(|r| r.id != id && &r.name == name) {
                return Err(CoreError::DuplicateName(name.clone()));
            }
        }

        let row = row_mut(&mut rows, id)?;
        if let Some(name) = update.name {
            row.name = name;
        }
        if let Some(description) = update.description {
            row.description = Some(description).filter(|d| !d.is_empty());
        }
        row.updated_at = chrono::Utc::now();
        row.to_project()
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), CoreError> {
        let mut rows = self.rows.write().await;
        rows.remove(&id)
            .map(|_| ())
            .ok_or_else(|| CoreError::project_not_found(id))
    }

    async fn list_scripts(&self, project_id: ProjectId) -> Result<Vec<Script>, CoreError> {
        Ok(self.get_project_by_id(project_id).await?.data.scripts)
    }

    async fn get_script(
        &self,
        project_id: ProjectId,
        script_id: &str,
    ) -> Result<Script, CoreError> {
        let project = self.get_project_by_id(project_id).await?;
        project
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

        let mut rows = self.rows.write().await;
        let row = row_mut(&mut rows, project_id)?;
        let mut data = decode_project_data(&row.stored())?;
        if data.find(&script.script_id).is_some() {
            return Err(CoreError::DuplicateScriptId {
                project_id,
                script_id: script.script_id,
            });
        }
        data.scripts.push(script.clone());
        row.write_data(&data)?;
        Ok(script)
    }

    async fn update_script(
        &self,
        project_id: ProjectId,
        script_id: &str,
        input: UpdateScript,
    ) -> Result<Script, CoreError> {
        let mut rows = self.rows.write().await;
        let row = row_mut(&mut rows, project_id)?;
        let mut data = decode_project_data(&row.stored())?;
        let index = data
            .position(script_id)
            .ok_or_else(|| CoreError::script_not_found(script_id))?;

        let updated = input.apply_to(&data.scripts[index])?;
        data.scripts[index] = updated.clone();
        row.write_data(&data)?;
        Ok(updated)
    }

    async fn delete_script(&self, project_id: ProjectId, script_id: &str) -> Result<(), CoreError> {
        let mut rows = self.rows.write().await;
        let row = row_mut(&mut rows, project_id)?;
        let mut data = decode_project_data(&row.stored())?;
        let index = data
            .position(script_id)
            .ok_or_else(|| CoreError::script_not_found(script_id))?;
        data.scripts.remove(index);
        row.write_data(&data)
    }

    async fn migrate_legacy(&self) -> Result<MigrationOutcome, CoreError> {
        let mut rows = self.rows.write().await;
        let records: Vec<StoredRecord> = rows.values().map(Row::stored).collect();

        // Planning touches nothing; the map is only written once every record
        // has been transformed.
        let plan = plan_migration(&records)?;
        let mut staged = rows.clone();
        for (id, data) in &plan.updates {
            row_mut(&mut staged, *id)?.write_data(data)?;
        }
        *rows = staged;

        let outcome = plan.outcome();
        tracing::info!(
            migrated = outcome.migrated,
            skipped = outcome.skipped,
            "Legacy project migration complete"
        );
        Ok(outcome)
    }

    async fn rollback_migration(&self) -> Result<RollbackOutcome, CoreError> {
        let mut rows = self.rows.write().await;
        let mut staged = rows.clone();
        let mut rolled_back = 0;
        for row in staged.values_mut() {
            if let Some((script_id, data)) = rollback_record(&row.stored())? {
                row.script_id = Some(script_id);
                row.data = data;
                row.updated_at = chrono::Utc::now();
                rolled_back += 1;
            }
        }
        let total = staged.len();
        *rows = staged;

        tracing::warn!(rolled_back, "Project migration rolled back");
        Ok(RollbackOutcome { rolled_back, total })
    }

    async fn migration_status(&self) -> Result<MigrationStatus, CoreError> {
        let rows = self.rows.read().await;
        let records: Vec<StoredRecord> = rows.values().map(Row::stored).collect();
        Ok(migration_status(&records))
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
