//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Plain reads and single-statement writes accept `&PgPool`; steps that must
//! run inside a caller's transaction accept `&mut PgConnection`.

pub mod migration_repo;
pub mod project_repo;

pub use migration_repo::MigrationRepo;
pub use project_repo::ProjectRepo;
