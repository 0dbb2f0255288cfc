//! Row model for the `projects` table.

use addata_core::error::CoreError;
use addata_core::migration::{decode_project_data, raw_script_count, StoredRecord};
use addata_core::project::{Project, ProjectSummary};
use addata_core::types::{ProjectId, Timestamp};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;

/// A project row as stored. `data` is left undecoded so legacy rows can be
/// read without failing.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    /// Legacy single-script id. `NULL` once the row is migrated.
    pub script_id: Option<String>,
    pub data: Json<Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProjectRow {
    pub fn stored(&self) -> StoredRecord {
        StoredRecord {
            id: self.id,
            name: self.name.clone(),
            script_id: self.script_id.clone(),
            data: self.data.0.clone(),
        }
    }

    /// Listing view read from the raw document without decoding AdData.
    pub fn summary(&self) -> ProjectSummary {
        let script_count = raw_script_count(&self.data.0);
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

    /// Decode into a [`Project`], normalizing legacy rows on the fly.
    pub fn into_project(self) -> Result<Project, CoreError> {
        let data = decode_project_data(&self.stored())?;
        Ok(Project {
            id: self.id,
            name: self.name,
            description: self.description,
            data,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
