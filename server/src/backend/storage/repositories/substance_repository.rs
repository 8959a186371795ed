use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{parse_closed, parse_utc};
use crate::backend::domain::models::datetime::format_utc;
use crate::backend::domain::models::substance::Substance;
use crate::backend::storage::connection::DbConnection;
use crate::backend::storage::traits::SubstanceStorage;

const SUBSTANCE_COLUMNS: &str = "id, user_id, child_id, name, type, dosage, unit, description, \
     instructions, is_active, color, created_at, updated_at";

/// Substance columns of a `substances s` join, each aliased with an `s_` prefix
pub(crate) const JOINED_SUBSTANCE_COLUMNS: &str = "s.id AS s_id, s.user_id AS s_user_id, \
     s.child_id AS s_child_id, s.name AS s_name, s.type AS s_type, s.dosage AS s_dosage, \
     s.unit AS s_unit, s.description AS s_description, s.instructions AS s_instructions, \
     s.is_active AS s_is_active, s.color AS s_color, s.created_at AS s_created_at, \
     s.updated_at AS s_updated_at";

/// Repository for substances
#[derive(Clone)]
pub struct SubstanceRepository {
    db: DbConnection,
}

impl SubstanceRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

/// Read a substance from `row`, where every column name carries `prefix`
pub(crate) fn substance_from_row(row: &SqliteRow, prefix: &str) -> Result<Substance> {
    let column = |name: &str| format!("{}{}", prefix, name);
    let substance_type: String = row.get(column("type").as_str());
    Ok(Substance {
        id: row.get(column("id").as_str()),
        user_id: row.get(column("user_id").as_str()),
        child_id: row.get(column("child_id").as_str()),
        name: row.get(column("name").as_str()),
        substance_type: parse_closed(&substance_type)?,
        dosage: row.get(column("dosage").as_str()),
        unit: row.get(column("unit").as_str()),
        description: row.get(column("description").as_str()),
        instructions: row.get(column("instructions").as_str()),
        is_active: row.get(column("is_active").as_str()),
        color: row.get(column("color").as_str()),
        created_at: parse_utc(row.get(column("created_at").as_str()))?,
        updated_at: parse_utc(row.get(column("updated_at").as_str()))?,
    })
}

#[async_trait]
impl SubstanceStorage for SubstanceRepository {
    async fn store_substance(&self, substance: &Substance) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO substances (id, user_id, child_id, name, type, dosage, unit, description,
                instructions, is_active, color, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&substance.id)
        .bind(&substance.user_id)
        .bind(&substance.child_id)
        .bind(&substance.name)
        .bind(substance.substance_type.as_str())
        .bind(&substance.dosage)
        .bind(&substance.unit)
        .bind(&substance.description)
        .bind(&substance.instructions)
        .bind(substance.is_active)
        .bind(&substance.color)
        .bind(format_utc(substance.created_at))
        .bind(format_utc(substance.updated_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_substance(&self, user_id: &str, substance_id: &str) -> Result<Option<Substance>> {
        let sql = format!(
            "SELECT {} FROM substances WHERE id = ? AND user_id = ?",
            SUBSTANCE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(substance_id)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(|r| substance_from_row(r, "")).transpose()
    }

    async fn list_substances(&self, child_id: &str, active_only: bool) -> Result<Vec<Substance>> {
        let filter = if active_only { " AND is_active = TRUE" } else { "" };
        let sql = format!(
            "SELECT {} FROM substances WHERE child_id = ?{} ORDER BY name ASC",
            SUBSTANCE_COLUMNS, filter
        );
        let rows = sqlx::query(&sql)
            .bind(child_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(|r| substance_from_row(r, "")).collect()
    }

    async fn update_substance(&self, substance: &Substance) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE substances
            SET name = ?, type = ?, dosage = ?, unit = ?, description = ?, instructions = ?,
                is_active = ?, color = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&substance.name)
        .bind(substance.substance_type.as_str())
        .bind(&substance.dosage)
        .bind(&substance.unit)
        .bind(&substance.description)
        .bind(&substance.instructions)
        .bind(substance.is_active)
        .bind(&substance.color)
        .bind(format_utc(substance.updated_at))
        .bind(&substance.id)
        .bind(&substance.user_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn delete_substance(&self, user_id: &str, substance_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM substances WHERE id = ? AND user_id = ?")
            .bind(substance_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
