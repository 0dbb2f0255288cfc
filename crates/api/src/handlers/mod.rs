//! Request handlers.
//!
//! Handlers decode request bodies into core DTOs, call the
//! [`ProjectStore`](addata_core::store::ProjectStore) held in
//! [`AppState`](crate::state::AppState), and map errors via
//! [`AppError`](crate::error::AppError).

pub mod migration;
pub mod project;
pub mod scripts;
