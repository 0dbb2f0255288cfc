//! Route definitions for the `/projects` resource.
//!
//! Also nests script routes under `/projects/{id}/scripts`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{project, scripts};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                                  -> list
/// POST   /                                  -> create
/// GET    /script-ids                        -> list_script_ids
/// POST   /import                            -> import
/// GET    /by-name/{name}                    -> get_by_name
/// GET    /{id}                              -> get_by_id
/// PUT    /{id}                              -> update
/// DELETE /{id}                              -> delete
/// GET    /{id}/export                       -> export
///
/// GET    /{id}/scripts                      -> list
/// POST   /{id}/scripts                      -> create
/// GET    /{id}/scripts/{script_id}          -> get
/// PUT    /{id}/scripts/{script_id}          -> update
/// DELETE /{id}/scripts/{script_id}          -> delete
/// ```
pub fn router() -> Router<AppState> {
    let script_routes = Router::new()
        .route("/", get(scripts::list).post(scripts::create))
        .route(
            "/{script_id}",
            get(scripts::get)
                .put(scripts::update)
                .delete(scripts::delete),
        );

    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/script-ids", get(project::list_script_ids))
        .route("/import", post(project::import))
        .route("/by-name/{name}", get(project::get_by_name))
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .delete(project::delete),
        )
        .route("/{id}/export", get(project::export))
        .nest("/{id}/scripts", script_routes)
}
