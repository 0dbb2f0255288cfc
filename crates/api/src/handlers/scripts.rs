//! Handlers for scripts nested under `/projects/{id}/scripts`.

use addata_core::ad_data::AdData;
use addata_core::error::CoreError;
use addata_core::policy::ensure_script_removable;
use addata_core::project::{NewScript, Script, ScriptInput, UpdateScript};
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

/// Request body for a partial script update. `data`, when present, replaces
/// the whole document.
#[derive(Debug, Deserialize)]
pub struct UpdateScriptRequest {
    pub name: Option<String>,
    pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedScript {
    pub script_id: String,
    pub deleted: bool,
}

/// GET /api/v1/projects/{id}/scripts
pub async fn list(
    State(state): State<AppState>,
    ValidPath(project_id): ValidPath<ProjectId>,
) -> AppResult<Json<DataResponse<Vec<Script>>>> {
    let scripts = state.store.list_scripts(project_id).await?;
    Ok(Json(DataResponse { data: scripts }))
}

/// GET /api/v1/projects/{id}/scripts/{script_id}
pub async fn get(
    State(state): State<AppState>,
    ValidPath((project_id, script_id)): ValidPath<(ProjectId, String)>,
) -> AppResult<Json<DataResponse<Script>>> {
    let script = state.store.get_script(project_id, &script_id).await?;
    Ok(Json(DataResponse { data: script }))
}

/// POST /api/v1/projects/{id}/scripts
///
/// Body: `{ "scriptId": ..., "name": ..., "data"?: AdData }`.
pub async fn create(
    State(state): State<AppState>,
    ValidPath(project_id): ValidPath<ProjectId>,
    ValidJson(body): ValidJson<Value>,
) -> AppResult<(StatusCode, Json<DataResponse<Script>>)> {
    let parsed = ScriptInput::from_value(&body, "Script")?.into_script(false)?;
    let script = state
        .store
        .add_script(
            project_id,
            NewScript {
                script_id: parsed.script_id,
                name: parsed.name,
                data: Some(parsed.data),
            },
        )
        .await?;

    tracing::info!(%project_id, script_id = %script.script_id, "Script added");
    Ok((StatusCode::CREATED, Json(DataResponse { data: script })))
}

/// PUT /api/v1/projects/{id}/scripts/{script_id}
pub async fn update(
    State(state): State<AppState>,
    ValidPath((project_id, script_id)): ValidPath<(ProjectId, String)>,
    ValidJson(input): ValidJson<UpdateScriptRequest>,
) -> AppResult<Json<DataResponse<Script>>> {
    let data = input.data.as_ref().map(AdData::parse).transpose()?;
    let script = state
        .store
        .update_script(
            project_id,
            &script_id,
            UpdateScript {
                name: input.name,
                data,
            },
        )
        .await?;
    Ok(Json(DataResponse { data: script }))
}

/// DELETE /api/v1/projects/{id}/scripts/{script_id}
///
/// Refuses to delete the last remaining script of a project.
pub async fn delete(
    State(state): State<AppState>,
    ValidPath((project_id, script_id)): ValidPath<(ProjectId, String)>,
) -> AppResult<Json<DataResponse<DeletedScript>>> {
    let project = state.store.get_project_by_id(project_id).await?;
    if project.data.find(&script_id).is_none() {
        return Err(CoreError::script_not_found(&script_id).into());
    }
    ensure_script_removable(project.data.scripts.len())?;

    state.store.delete_script(project_id, &script_id).await?;

    tracing::info!(%project_id, %script_id, "Script deleted");
    Ok(Json(DataResponse {
        data: DeletedScript {
            script_id,
            deleted: true,
        },
    }))
}
