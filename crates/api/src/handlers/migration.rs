//! Handlers for the legacy single-script to multi-script migration.

use addata_core::migration::{MigrationOutcome, MigrationStatus, RollbackOutcome};
use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/migration/status
pub async fn status(State(state): State<AppState>) -> AppResult<Json<DataResponse<MigrationStatus>>> {
    let status = state.store.migration_status().await?;
    Ok(Json(DataResponse { data: status }))
}

/// POST /api/v1/migration/to-scripts
///
/// Rewrites every legacy project in one all-or-nothing pass. Safe to run
/// repeatedly; already-migrated projects are skipped.
pub async fn migrate(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<MigrationOutcome>>> {
    let outcome = state.store.migrate_legacy().await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/migration/rollback-scripts
///
/// Restores the legacy shape from each project's first script. Any later
/// scripts are dropped.
pub async fn rollback(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<RollbackOutcome>>> {
    let outcome = state.store.rollback_migration().await?;
    Ok(Json(DataResponse { data: outcome }))
}
