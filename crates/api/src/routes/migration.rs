//! Route definitions for the legacy document migration.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::migration;
use crate::state::AppState;

/// Routes mounted at `/migration`.
///
/// ```text
/// GET    /status                            -> status
/// POST   /to-scripts                        -> migrate
/// POST   /rollback-scripts                  -> rollback
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(migration::status))
        .route("/to-scripts", post(migration::migrate))
        .route("/rollback-scripts", post(migration::rollback))
}
