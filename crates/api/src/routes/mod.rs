pub mod health;
pub mod migration;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /projects                                        list, create
/// /projects/script-ids                             all script ids in use
/// /projects/import                                 import a project file (POST)
/// /projects/by-name/{name}                         get by exact name
/// /projects/{id}                                   get, update, delete
/// /projects/{id}/export                            export file
/// /projects/{id}/scripts                           list, add
/// /projects/{id}/scripts/{script_id}               get, update, delete
///
/// /migration/status                                shape counts
/// /migration/to-scripts                            migrate legacy rows (POST)
/// /migration/rollback-scripts                      roll back (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", project::router())
        .nest("/migration", migration::router())
}
