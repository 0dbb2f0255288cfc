//! Bulk reads and writes used by the legacy document migration.

use addata_core::types::ProjectId;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::project::ProjectRow;
use crate::repositories::project_repo::COLUMNS;

pub struct MigrationRepo;

impl MigrationRepo {
    /// Every project row, unlocked. Used for status reporting.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects ORDER BY created_at ASC");
        sqlx::query_as::<_, ProjectRow>(&query).fetch_all(pool).await
    }

    /// Every project row, locked for the rest of the transaction so no write
    /// can slip in between planning and applying a migration.
    pub async fn lock_all(conn: &mut PgConnection) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects ORDER BY created_at ASC FOR UPDATE");
        sqlx::query_as::<_, ProjectRow>(&query).fetch_all(conn).await
    }

    /// Put a row back into the legacy single-script shape.
    pub async fn restore_legacy(
        conn: &mut PgConnection,
        id: ProjectId,
        script_id: &str,
        data: &Value,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET script_id = $2, data = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(script_id)
        .bind(Json(data))
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert a row in the legacy shape, bypassing validation. Used to load
    /// data exported by the single-script version of the tool.
    pub async fn insert_legacy(
        pool: &PgPool,
        id: ProjectId,
        name: &str,
        script_id: Option<&str>,
        data: &Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO projects (id, name, script_id, data) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(name)
            .bind(script_id)
            .bind(Json(data))
            .execute(pool)
            .await?;
        Ok(())
    }
}
