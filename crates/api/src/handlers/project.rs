//! Handlers for the `/projects` resource.

use addata_core::error::CoreError;
use addata_core::project::{NewProject, Project, ProjectSummary, Script, ScriptInput, UpdateProject};
use addata_core::transfer::{decode_import, ImportShape, ProjectExport};
use addata_core::types::ProjectId;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppResult;
use crate::extract::{ValidJson, ValidPath};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response DTOs
// ---------------------------------------------------------------------------

/// Request body for creating a project.
///
/// Scripts are kept as raw JSON so every field error can be reported with
/// the same taxonomy as the store uses.
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub scripts: Option<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedProject {
    pub id: ProjectId,
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedProjectResponse {
    #[serde(flatten)]
    pub project: Project,
    pub imported_from: ImportShape,
}

/// Decode every script in a create request, collecting all field errors
/// before failing. A script without `data` gets the default document.
fn parse_scripts(raw: &[Value]) -> Result<Vec<Script>, CoreError> {
    let mut scripts = Vec::with_capacity(raw.len());
    let mut errors = Vec::new();
    for (i, value) in raw.iter().enumerate() {
        match ScriptInput::from_value(value, &format!("Script {i}"))
            .and_then(|input| input.into_script(false))
        {
            Ok(script) => scripts.push(script),
            Err(CoreError::Validation(mut e)) => errors.append(&mut e),
            Err(other) => return Err(other),
        }
    }
    if errors.is_empty() {
        Ok(scripts)
    } else {
        Err(CoreError::Validation(errors))
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    let scripts = input.scripts.as_deref().map(parse_scripts).transpose()?;
    let project = state
        .store
        .create_project(NewProject {
            name: input.name,
            description: input.description,
            scripts,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<ProjectSummary>>>> {
    let projects = state.store.list_projects().await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/script-ids
pub async fn list_script_ids(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let ids = state.store.list_script_ids().await?;
    Ok(Json(DataResponse { data: ids }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<ProjectId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = state.store.get_project_by_id(id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// GET /api/v1/projects/by-name/{name}
pub async fn get_by_name(
    State(state): State<AppState>,
    ValidPath(name): ValidPath<String>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = state.store.get_project_by_name(&name).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}
///
/// A supplied `name` renames the project and must differ from the current
/// one. An empty `description` clears it.
pub async fn update(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<ProjectId>,
    ValidJson(input): ValidJson<UpdateProject>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = state.store.update_project(id, input).await?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<ProjectId>,
) -> AppResult<Json<DataResponse<DeletedProject>>> {
    state.store.delete_project(id).await?;
    Ok(Json(DataResponse {
        data: DeletedProject { id, deleted: true },
    }))
}

/// GET /api/v1/projects/{id}/export
pub async fn export(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<ProjectId>,
) -> AppResult<Json<DataResponse<ProjectExport>>> {
    let project = state.store.get_project_by_id(id).await?;
    tracing::info!(project_id = %id, name = %project.name, "Project exported");
    Ok(Json(DataResponse {
        data: ProjectExport::new(project),
    }))
}

/// POST /api/v1/projects/import
///
/// Accepts an export file in either the current or the legacy shape and
/// creates a new project named `{name}_imported`.
pub async fn import(
    State(state): State<AppState>,
    ValidJson(file): ValidJson<Value>,
) -> AppResult<(StatusCode, Json<DataResponse<ImportedProjectResponse>>)> {
    let imported = decode_import(&file)?;
    let project = state.store.create_project(imported.project).await?;

    tracing::info!(
        project_id = %project.id,
        name = %project.name,
        shape = ?imported.shape,
        "Project imported",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ImportedProjectResponse {
                project,
                imported_from: imported.shape,
            },
        }),
    ))
}
