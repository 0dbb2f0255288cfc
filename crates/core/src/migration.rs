//! Legacy single-script to multi-script document migration.
//!
//! Legacy records carry a top-level `scriptId` and an AdData document
//! directly in `data`. Migrated records hold `{ "scripts": [...] }` in
//! `data` and no top-level `scriptId`. The transforms here are pure; store
//! backends run them over every record inside one transaction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ad_data::AdData;
use crate::error::CoreError;
use crate::project::{ProjectData, Script, DEFAULT_SCRIPT_ID, DEFAULT_SCRIPT_NAME};
use crate::types::ProjectId;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A project as stored, before its `data` document has been interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: ProjectId,
    pub name: String,
    /// Legacy top-level script id. `None` once migrated.
    pub script_id: Option<String>,
    pub data: Value,
}

/// Which of the two document shapes a stored `data` value is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    /// `{ "scripts": [...] }`.
    Scripts,
    /// A bare AdData document (or nothing at all).
    Legacy,
}

/// Placeholder id and name for a script synthesized from a legacy record.
#[derive(Debug, Clone, Copy)]
pub struct LegacyFallback {
    pub script_id: &'static str,
    pub script_name: &'static str,
}

/// Fallback used by the bulk migration.
pub const MIGRATION_FALLBACK: LegacyFallback = LegacyFallback {
    script_id: DEFAULT_SCRIPT_ID,
    script_name: DEFAULT_SCRIPT_NAME,
};

/// Counts reported by a migration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationOutcome {
    pub migrated: usize,
    pub skipped: usize,
    pub total: usize,
}

/// Counts reported by a rollback pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackOutcome {
    pub rolled_back: usize,
    pub total: usize,
}

/// How many projects are in each document shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    pub total_projects: usize,
    pub old_structure_count: usize,
    pub new_structure_count: usize,
    pub is_fully_migrated: bool,
    pub needs_migration: bool,
}

/// Work computed for one migration pass: the rewritten documents plus the
/// number of records left alone.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    pub updates: Vec<(ProjectId, ProjectData)>,
    pub skipped: usize,
}

impl MigrationPlan {
    pub fn outcome(&self) -> MigrationOutcome {
        MigrationOutcome {
            migrated: self.updates.len(),
            skipped: self.skipped,
            total: self.updates.len() + self.skipped,
        }
    }
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

/// Classify a stored `data` value.
///
/// A `scripts` key that is present but not an array is malformed rather than
/// legacy, so it is never silently rewritten.
pub fn document_shape(data: &Value) -> Result<DocumentShape, String> {
    match data {
        Value::Null => Ok(DocumentShape::Legacy),
        Value::Object(obj) => match obj.get("scripts") {
            None => Ok(DocumentShape::Legacy),
            Some(Value::Array(_)) => Ok(DocumentShape::Scripts),
            Some(_) => Err("`scripts` is present but is not an array".to_string()),
        },
        _ => Err("document is not a JSON object".to_string()),
    }
}

/// Id and name for a script synthesized from a legacy record.
///
/// With a legacy id the script is named `Script {id}`; without one the
/// fallback id and name are used.
pub fn legacy_script_identity(
    script_id: Option<&str>,
    fallback: LegacyFallback,
) -> (String, String) {
    match script_id.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => (id.to_string(), format!("Script {id}")),
        None => (
            fallback.script_id.to_string(),
            fallback.script_name.to_string(),
        ),
    }
}

/// Build the single script that replaces a legacy document. A missing
/// document becomes the default AdData.
pub fn script_from_legacy(
    script_id: Option<&str>,
    data: &Value,
    fallback: LegacyFallback,
) -> Result<Script, String> {
    let (script_id, name) = legacy_script_identity(script_id, fallback);
    let data = match data {
        Value::Null => AdData::default(),
        other => serde_json::from_value::<AdData>(other.clone())
            .map_err(|e| format!("legacy AdData could not be decoded: {e}"))?,
    };
    Ok(Script {
        script_id,
        name,
        data,
    })
}

/// Compute the migrated document for one record, or `None` when it is
/// already in the multi-script shape.
pub fn migrate_record(record: &StoredRecord) -> Result<Option<ProjectData>, CoreError> {
    let shape = document_shape(&record.data).map_err(|e| malformed(record, &e))?;
    if shape == DocumentShape::Scripts {
        return Ok(None);
    }
    let script = script_from_legacy(record.script_id.as_deref(), &record.data, MIGRATION_FALLBACK)
        .map_err(|e| malformed(record, &e))?;
    Ok(Some(ProjectData {
        scripts: vec![script],
    }))
}

/// Interpret a stored record as a multi-script document.
///
/// Legacy records are normalized in memory with the migration transform;
/// nothing is written back.
pub fn decode_project_data(record: &StoredRecord) -> Result<ProjectData, CoreError> {
    match migrate_record(record)? {
        Some(data) => Ok(data),
        None => serde_json::from_value(record.data.clone())
            .map_err(|e| malformed(record, &format!("scripts could not be decoded: {e}"))),
    }
}

/// Script count of a stored document read from its raw shape. A legacy
/// document counts as one script; a malformed one as none.
pub fn raw_script_count(data: &Value) -> usize {
    match document_shape(data) {
        Ok(DocumentShape::Scripts) => data["scripts"].as_array().map_or(0, Vec::len),
        Ok(DocumentShape::Legacy) => 1,
        Err(_) => 0,
    }
}

/// Script ids of a stored record, read without decoding any AdData.
///
/// Legacy records report the id they would migrate to. Script entries
/// without a string `scriptId` are ignored.
pub fn raw_script_ids(record: &StoredRecord) -> Result<Vec<String>, CoreError> {
    match document_shape(&record.data).map_err(|e| malformed(record, &e))? {
        DocumentShape::Legacy => {
            let (id, _) = legacy_script_identity(record.script_id.as_deref(), MIGRATION_FALLBACK);
            Ok(vec![id])
        }
        DocumentShape::Scripts => Ok(record.data["scripts"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|s| s.get("scriptId").and_then(Value::as_str))
            .map(str::to_string)
            .collect()),
    }
}

/// Plan a migration over every record. Any malformed record fails the whole
/// plan so that nothing is written.
pub fn plan_migration(records: &[StoredRecord]) -> Result<MigrationPlan, CoreError> {
    let mut plan = MigrationPlan::default();
    for record in records {
        match migrate_record(record)? {
            Some(data) => plan.updates.push((record.id, data)),
            None => plan.skipped += 1,
        }
    }
    Ok(plan)
}

/// Compute the legacy `(scriptId, data)` pair for a migrated record, taken
/// from its first script. Returns `None` for legacy records and for migrated
/// records with no scripts. Later scripts are lost.
pub fn rollback_record(record: &StoredRecord) -> Result<Option<(String, Value)>, CoreError> {
    let shape = document_shape(&record.data).map_err(|e| malformed(record, &e))?;
    if shape == DocumentShape::Legacy {
        return Ok(None);
    }
    let Some(first) = record.data["scripts"].as_array().and_then(|s| s.first()) else {
        return Ok(None);
    };
    let script_id = first
        .get("scriptId")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(record, "first script has no scriptId"))?
        .to_string();
    let data = first.get("data").cloned().unwrap_or(Value::Null);
    Ok(Some((script_id, data)))
}

/// Tally document shapes. Malformed documents count as old structure since
/// they need attention before the set is fully migrated.
pub fn migration_status(records: &[StoredRecord]) -> MigrationStatus {
    let new_structure_count = records
        .iter()
        .filter(|r| matches!(document_shape(&r.data), Ok(DocumentShape::Scripts)))
        .count();
    let total_projects = records.len();
    let old_structure_count = total_projects - new_structure_count;
    MigrationStatus {
        total_projects,
        old_structure_count,
        new_structure_count,
        is_fully_migrated: old_structure_count == 0 && total_projects > 0,
        needs_migration: old_structure_count > 0,
    }
}

fn malformed(record: &StoredRecord, reason: &str) -> CoreError {
    CoreError::Storage(format!(
        "Project {} ('{}') has a malformed document: {reason}",
        record.id, record.name
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
