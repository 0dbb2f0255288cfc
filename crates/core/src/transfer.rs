//! Project export files and import decoding.
//!
//! Exports carry the full project plus `exportedAt`, a format `version` and
//! a `structure` tag. Imports accept the current multi-script shape and the
//! legacy single-script shape; legacy files are normalized the same way the
//! bulk migration rewrites stored records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ad_data::{AdData, FIELD_BIDFLOOR_CONFIG, FIELD_DEFAULT_AD_UNIT_DATA};
use crate::error::CoreError;
use crate::migration::{legacy_script_identity, LegacyFallback};
use crate::project::{NewProject, Project, ProjectData, Script};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Format version written into export files.
pub const EXPORT_FORMAT_VERSION: &str = "2.0.0";

/// Structure tag of the multi-script export shape.
pub const EXPORT_STRUCTURE: &str = "scripts";

/// Appended to the project name on import so the copy never collides with
/// the project it was exported from.
pub const IMPORT_NAME_SUFFIX: &str = "_imported";

/// Placeholder for legacy files without a `scriptId`.
pub const IMPORT_FALLBACK: LegacyFallback = LegacyFallback {
    script_id: "IMPORTED",
    script_name: "Imported Script",
};

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// A downloadable project file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectExport {
    #[serde(flatten)]
    pub project: Project,
    pub exported_at: Timestamp,
    pub version: String,
    pub structure: String,
}

impl ProjectExport {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            exported_at: chrono::Utc::now(),
            version: EXPORT_FORMAT_VERSION.to_string(),
            structure: EXPORT_STRUCTURE.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Which shape an import file was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportShape {
    Current,
    Legacy,
}

/// A decoded import file, ready to be created through the store.
#[derive(Debug, Clone)]
pub struct ImportedProject {
    pub shape: ImportShape,
    pub project: NewProject,
}

/// Decode an import file.
///
/// The current shape (`data.scripts` array) is tried first. Otherwise a
/// legacy file (`scriptId` plus an AdData document in `data`) is normalized
/// into one script. Anything else is rejected.
pub fn decode_import(doc: &Value) -> Result<ImportedProject, CoreError> {
    let obj = doc
        .as_object()
        .ok_or_else(|| CoreError::validation("Import file must be a JSON object"))?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| CoreError::validation("Import file is missing the project name"))?;
    let description = match obj.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(d)) => Some(d.clone()),
        Some(_) => return Err(CoreError::validation("description must be a string")),
    };
    let data = obj
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| CoreError::validation("Import file is missing the project data"))?;

    let (shape, scripts) = if data.contains_key("scripts") {
        let parsed = ProjectData::parse(&Value::Object(data.clone()))?;
        (ImportShape::Current, parsed.scripts)
    } else if looks_like_ad_data(data) {
        let script_id = obj.get("scriptId").and_then(Value::as_str);
        (
            ImportShape::Legacy,
            vec![legacy_script(script_id, data)?],
        )
    } else {
        return Err(CoreError::validation(
            "Unrecognized project file: data is neither a scripts document nor an AdData document",
        ));
    };

    Ok(ImportedProject {
        shape,
        project: NewProject {
            name: format!("{}{IMPORT_NAME_SUFFIX}", name.trim()),
            description,
            scripts: Some(scripts),
        },
    })
}

fn looks_like_ad_data(data: &Map<String, Value>) -> bool {
    data.contains_key(FIELD_DEFAULT_AD_UNIT_DATA) || data.contains_key(FIELD_BIDFLOOR_CONFIG)
}

fn legacy_script(script_id: Option<&str>, data: &Map<String, Value>) -> Result<Script, CoreError> {
    let ad_data = AdData::parse(&Value::Object(data.clone()))?;
    let (script_id, name) = legacy_script_identity(script_id, IMPORT_FALLBACK);
    let script = Script {
        script_id,
        name,
        data: ad_data,
    };
    script.validate()?;
    Ok(script)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn ad_data() -> Value {
        json!({
            "defaultAdUnitData": { "interstitialId": "a1b2c3d4e5f6g7h8" },
            "bidfloorConfig": { "banner": { "bidfloorBanner": "k1l2m3n4o5p6q7r8" } }
        })
    }

    #[test]
    fn decodes_current_shape() {
        let imported = decode_import(&json!({
            "name": "Demo",
            "description": "exported",
            "data": { "scripts": [
                { "scriptId": "A", "name": "First", "data": ad_data() },
                { "scriptId": "B", "name": "Second", "data": ad_data() }
            ]},
            "exportedAt": "2026-01-01T00:00:00Z",
            "version": "2.0.0",
            "structure": "scripts"
        }))
        .unwrap();

        assert_eq!(imported.shape, ImportShape::Current);
        assert_eq!(imported.project.name, "Demo_imported");
        assert_eq!(imported.project.description.as_deref(), Some("exported"));
        let scripts = imported.project.scripts.unwrap();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[1].script_id, "B");
    }

    #[test]
    fn normalizes_legacy_shape() {
        let imported = decode_import(&json!({
            "name": "Old",
            "scriptId": "GAME_1",
            "data": ad_data()
        }))
        .unwrap();

        assert_eq!(imported.shape, ImportShape::Legacy);
        let scripts = imported.project.scripts.unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].script_id, "GAME_1");
        assert_eq!(scripts[0].name, "Script GAME_1");
        assert_eq!(
            scripts[0].data.default_ad_unit_data.interstitial_id,
            "a1b2c3d4e5f6g7h8"
        );
    }

    #[test]
    fn legacy_without_script_id_uses_placeholder() {
        let imported = decode_import(&json!({ "name": "Old", "data": ad_data() })).unwrap();
        let scripts = imported.project.scripts.unwrap();
        assert_eq!(scripts[0].script_id, "IMPORTED");
        assert_eq!(scripts[0].name, "Imported Script");
    }

    #[test]
    fn legacy_with_invalid_ad_id_is_rejected() {
        let mut data = ad_data();
        data["defaultAdUnitData"]["bannerId"] = json!("TOO-SHORT");
        let err = decode_import(&json!({ "name": "Old", "data": data })).unwrap_err();
        assert_matches!(err, CoreError::Validation(errors) if errors[0].contains("bannerId"));
    }

    #[test]
    fn unrecognized_shapes_are_rejected() {
        assert_matches!(decode_import(&json!([])), Err(CoreError::Validation(_)));
        assert_matches!(
            decode_import(&json!({ "name": "X" })),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            decode_import(&json!({ "name": "X", "data": { "foo": 1 } })),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            decode_import(&json!({ "data": ad_data() })),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn export_carries_version_tags() {
        let now = chrono::Utc::now();
        let export = ProjectExport::new(Project {
            id: uuid::Uuid::new_v4(),
            name: "Demo".into(),
            description: None,
            data: ProjectData {
                scripts: vec![Script::seed()],
            },
            created_at: now,
            updated_at: now,
        });
        let value = serde_json::to_value(&export).unwrap();
        assert_eq!(value["name"], "Demo");
        assert_eq!(value["version"], EXPORT_FORMAT_VERSION);
        assert_eq!(value["structure"], "scripts");
        assert!(value["exportedAt"].is_string());
        assert_eq!(value["data"]["scripts"][0]["scriptId"], "DEFAULT");

        // An export file imports back as the current shape.
        let imported = decode_import(&value).unwrap();
        assert_eq!(imported.shape, ImportShape::Current);
    }
}
