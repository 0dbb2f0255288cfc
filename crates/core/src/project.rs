//! Project and script records, their field rules, and write DTOs.
//!
//! A project is a uniquely named container of scripts; each script wraps one
//! [`AdData`] document. The rules here are shared by every store backend so
//! that a request reaching the store directly is held to the same checks as
//! one coming through the HTTP layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ad_data::AdData;
use crate::error::CoreError;
use crate::types::{ProjectId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const MAX_PROJECT_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_SCRIPT_ID_LENGTH: usize = 50;

/// Script seeded into a project created without any scripts.
pub const DEFAULT_SCRIPT_ID: &str = "DEFAULT";
pub const DEFAULT_SCRIPT_NAME: &str = "Default Script";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One named AdData document inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub script_id: String,
    pub name: String,
    pub data: AdData,
}

impl Script {
    /// The script seeded into new projects: `DEFAULT` with an empty document.
    pub fn seed() -> Self {
        Self {
            script_id: DEFAULT_SCRIPT_ID.to_string(),
            name: DEFAULT_SCRIPT_NAME.to_string(),
            data: AdData::default(),
        }
    }

    /// Check the id, name and document of this script.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut errors = Vec::new();
        if let Err(CoreError::Validation(mut e)) = validate_script_id(&self.script_id) {
            errors.append(&mut e);
        }
        if self.name.trim().is_empty() {
            errors.push(format!("Script '{}': name must not be empty", self.script_id));
        }
        if let Err(CoreError::Validation(e)) = self.data.validate() {
            errors.extend(
                e.into_iter()
                    .map(|msg| format!("Script '{}': {msg}", self.script_id)),
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(errors))
        }
    }
}

/// The document stored in a migrated project's `data` column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectData {
    pub scripts: Vec<Script>,
}

impl ProjectData {
    /// Decode and validate a `{ "scripts": [...] }` document.
    ///
    /// Each script must carry `scriptId`, `name` and a valid `data` document.
    /// Errors from every script are collected before failing.
    pub fn parse(doc: &Value) -> Result<Self, CoreError> {
        let scripts = doc
            .get("scripts")
            .and_then(Value::as_array)
            .ok_or_else(|| CoreError::validation("Data must contain a scripts array"))?;

        let mut parsed = Vec::with_capacity(scripts.len());
        let mut errors = Vec::new();
        for (i, raw) in scripts.iter().enumerate() {
            match ScriptInput::from_value(raw, &format!("Script {i}"))
                .and_then(|input| input.into_script(true))
            {
                Ok(script) => parsed.push(script),
                Err(CoreError::Validation(mut e)) => errors.append(&mut e),
                Err(other) => return Err(other),
            }
        }
        if !errors.is_empty() {
            return Err(CoreError::Validation(errors));
        }
        Ok(Self { scripts: parsed })
    }

    pub fn find(&self, script_id: &str) -> Option<&Script> {
        self.scripts.iter().find(|s| s.script_id == script_id)
    }

    pub fn position(&self, script_id: &str) -> Option<usize> {
        self.scripts.iter().position(|s| s.script_id == script_id)
    }

    /// Validate every script and reject repeated script ids.
    pub fn validate(&self, project_id: ProjectId) -> Result<(), CoreError> {
        let mut seen = std::collections::HashSet::new();
        for script in &self.scripts {
            if !seen.insert(script.script_id.as_str()) {
                return Err(CoreError::DuplicateScriptId {
                    project_id,
                    script_id: script.script_id.clone(),
                });
            }
        }
        let mut errors = Vec::new();
        for script in &self.scripts {
            if let Err(CoreError::Validation(mut e)) = script.validate() {
                errors.append(&mut e);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(errors))
        }
    }
}

/// A full project record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub data: ProjectData,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Listing view of a project without script bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub script_count: usize,
    pub has_data: bool,
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

/// Trim a project name and check it is 1-100 characters.
pub fn normalize_project_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        return Err(CoreError::validation("Project name cannot be empty"));
    }
    if len > MAX_PROJECT_NAME_LENGTH {
        return Err(CoreError::validation(format!(
            "Project name must be between 1 and {MAX_PROJECT_NAME_LENGTH} characters (got {len})"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim a description and check it is at most 500 characters.
///
/// A blank description is stored as `None`.
pub fn normalize_description(description: Option<&str>) -> Result<Option<String>, CoreError> {
    let Some(trimmed) = description.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    let len = trimmed.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LENGTH} characters (got {len})"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

/// A script id must be non-blank and at most 50 characters.
pub fn validate_script_id(script_id: &str) -> Result<(), CoreError> {
    if script_id.trim().is_empty() {
        return Err(CoreError::validation("scriptId is required"));
    }
    let len = script_id.chars().count();
    if len > MAX_SCRIPT_ID_LENGTH {
        return Err(CoreError::validation(format!(
            "scriptId must be at most {MAX_SCRIPT_ID_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write DTOs
// ---------------------------------------------------------------------------

/// Input for creating a project.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    /// `None` or an empty list seeds the default script.
    pub scripts: Option<Vec<Script>>,
}

/// A validated project ready to be written by a store.
#[derive(Debug, Clone)]
pub struct PreparedProject {
    pub name: String,
    pub description: Option<String>,
    pub data: ProjectData,
}

impl NewProject {
    /// Apply field rules and seed the default script when none was given.
    pub fn prepare(self, project_id: ProjectId) -> Result<PreparedProject, CoreError> {
        let name = normalize_project_name(&self.name)?;
        let description = normalize_description(self.description.as_deref())?;
        let scripts = match self.scripts {
            Some(scripts) if !scripts.is_empty() => scripts,
            _ => vec![Script::seed()],
        };
        let data = ProjectData { scripts };
        data.validate(project_id)?;
        Ok(PreparedProject {
            name,
            description,
            data,
        })
    }
}

/// Partial update of a project's own fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl UpdateProject {
    /// Validate against the current record. A supplied name must differ from
    /// the current one.
    pub fn prepare(&self, current: &Project) -> Result<UpdateProject, CoreError> {
        let name = match &self.name {
            Some(name) => {
                let name = normalize_project_name(name)?;
                if name == current.name {
                    return Err(CoreError::validation(
                        "New project name must differ from the current name",
                    ));
                }
                Some(name)
            }
            None => None,
        };
        let description = match &self.description {
            Some(d) => Some(normalize_description(Some(d))?.unwrap_or_default()),
            None => None,
        };
        Ok(UpdateProject { name, description })
    }
}

/// Input for adding a script. `data: None` seeds an empty document.
#[derive(Debug, Clone)]
pub struct NewScript {
    pub script_id: String,
    pub name: String,
    pub data: Option<AdData>,
}

impl NewScript {
    pub fn into_script(self) -> Result<Script, CoreError> {
        let script = Script {
            script_id: self.script_id.trim().to_string(),
            name: self.name.trim().to_string(),
            data: self.data.unwrap_or_default(),
        };
        script.validate()?;
        Ok(script)
    }
}

/// Partial script update. `data`, when supplied, replaces the whole document.
#[derive(Debug, Clone, Default)]
pub struct UpdateScript {
    pub name: Option<String>,
    pub data: Option<AdData>,
}

impl UpdateScript {
    /// Apply the update to `script`, validating the result before it is kept.
    pub fn apply_to(self, script: &Script) -> Result<Script, CoreError> {
        let mut updated = script.clone();
        if let Some(name) = self.name {
            updated.name = name.trim().to_string();
        }
        if let Some(data) = self.data {
            updated.data = data;
        }
        updated.validate()?;
        Ok(updated)
    }
}

// ---------------------------------------------------------------------------
// Raw script input
// ---------------------------------------------------------------------------

/// A script as it appears in untyped JSON (request bodies, stored documents,
/// import files), before validation.
#[derive(Debug, Clone)]
pub struct ScriptInput {
    pub script_id: String,
    pub name: String,
    pub data: Option<Value>,
}

impl ScriptInput {
    /// Pull `scriptId`, `name` and `data` out of a JSON object. `label`
    /// prefixes error messages.
    pub fn from_value(raw: &Value, label: &str) -> Result<Self, CoreError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| CoreError::validation(format!("{label}: must be an object")))?;

        let mut errors = Vec::new();
        let script_id = match obj.get("scriptId").and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => {
                errors.push(format!("{label}: scriptId is required and must be a string"));
                String::new()
            }
        };
        let name = match obj.get("name").and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => {
                errors.push(format!("{label}: name is required and must be a string"));
                String::new()
            }
        };
        if !errors.is_empty() {
            return Err(CoreError::Validation(errors));
        }
        Ok(Self {
            script_id,
            name,
            data: obj.get("data").cloned(),
        })
    }

    /// Validate and convert into a [`Script`]. When `data_required` is false
    /// a missing document is replaced with the default one.
    pub fn into_script(self, data_required: bool) -> Result<Script, CoreError> {
        let label = format!("Script '{}'", self.script_id);
        let data = match self.data {
            Some(doc) => AdData::parse(&doc).map_err(|e| prefix_errors(e, &label))?,
            None if data_required => {
                return Err(CoreError::validation(format!(
                    "{label}: data is required and must be an object"
                )))
            }
            None => AdData::default(),
        };
        NewScript {
            script_id: self.script_id,
            name: self.name,
            data: Some(data),
        }
        .into_script()
    }
}

fn prefix_errors(err: CoreError, label: &str) -> CoreError {
    match err {
        CoreError::Validation(errors) => CoreError::Validation(
            errors.into_iter().map(|e| format!("{label}: {e}")).collect(),
        ),
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
