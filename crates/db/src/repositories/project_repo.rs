//! Repository for the `projects` table.

use addata_core::types::ProjectId;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::project::ProjectRow;

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str =
    "id, name, description, script_id, data, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    ///
    /// Fails with a `uq_projects_name` unique violation if the name is taken.
    pub async fn create(
        pool: &PgPool,
        id: ProjectId,
        name: &str,
        description: Option<&str>,
        data: &Value,
    ) -> Result<ProjectRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (id, name, description, data)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .bind(name)
            .bind(description)
            .bind(Json(data))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: ProjectId) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Exact, case-sensitive name lookup.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE name = $1");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// List all projects, most recently updated first.
    pub async fn list(pool: &PgPool) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects ORDER BY updated_at DESC, name ASC");
        sqlx::query_as::<_, ProjectRow>(&query).fetch_all(pool).await
    }

    /// Update name and description. `None` leaves a field unchanged; an
    /// empty description clears it.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: ProjectId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($2, name),
                description = CASE WHEN $3 THEN NULLIF($4, '') ELSE description END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .bind(name)
            .bind(description.is_some())
            .bind(description)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a project. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: ProjectId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Load a project and hold its row lock until the surrounding
    /// transaction ends. Serializes concurrent script edits on one project.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: ProjectId,
    ) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Replace the document with a multi-script one and clear the legacy
    /// script id. Returns `true` if a row was updated.
    pub async fn replace_data(
        conn: &mut PgConnection,
        id: ProjectId,
        data: &Value,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET data = $2, script_id = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(Json(data))
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
