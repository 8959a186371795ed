use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{is_unique_violation, parse_json, parse_optional_closed, parse_utc};
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::child::Child;
use crate::backend::domain::models::datetime::{format_date, format_utc, parse_date};
use crate::backend::storage::connection::DbConnection;
use crate::backend::storage::traits::ChildStorage;

const CHILD_COLUMNS: &str = "id, user_id, name, birth_date, gender, height_cm, weight_kg, \
     head_circumference_cm, blood_type, allergies, medical_conditions, notes, created_at, updated_at";

/// Repository for the child profile
#[derive(Clone)]
pub struct ChildRepository {
    db: DbConnection,
}

impl ChildRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn child_from_row(row: &SqliteRow) -> Result<Child> {
        let birth_date: Option<String> = row.get("birth_date");
        let allergies: String = row.get("allergies");
        Ok(Child {
            id: row.get("id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            birth_date: birth_date.as_deref().map(parse_date).transpose()?,
            gender: parse_optional_closed(row.get("gender"))?,
            height_cm: row.get("height_cm"),
            weight_kg: row.get("weight_kg"),
            head_circumference_cm: row.get("head_circumference_cm"),
            blood_type: row.get("blood_type"),
            allergies: parse_json(&allergies)?,
            medical_conditions: row.get("medical_conditions"),
            notes: row.get("notes"),
            created_at: parse_utc(row.get("created_at"))?,
            updated_at: parse_utc(row.get("updated_at"))?,
        })
    }
}

#[async_trait]
impl ChildStorage for ChildRepository {
    async fn store_child(&self, child: &Child) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO children (id, user_id, name, birth_date, gender, height_cm, weight_kg,
                head_circumference_cm, blood_type, allergies, medical_conditions, notes,
                created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&child.id)
        .bind(&child.user_id)
        .bind(&child.name)
        .bind(child.birth_date.map(format_date))
        .bind(child.gender.map(|g| g.as_str()))
        .bind(child.height_cm)
        .bind(child.weight_kg)
        .bind(child.head_circumference_cm)
        .bind(&child.blood_type)
        .bind(serde_json::to_string(&child.allergies)?)
        .bind(&child.medical_conditions)
        .bind(&child.notes)
        .bind(format_utc(child.created_at))
        .bind(format_utc(child.updated_at))
        .execute(self.db.pool())
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(DomainError::conflict("A child profile already exists for this user").into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_child_for_user(&self, user_id: &str) -> Result<Option<Child>> {
        let sql = format!("SELECT {} FROM children WHERE user_id = ? LIMIT 1", CHILD_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::child_from_row).transpose()
    }

    async fn update_child(&self, child: &Child) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE children
            SET name = ?, birth_date = ?, gender = ?, height_cm = ?, weight_kg = ?,
                head_circumference_cm = ?, blood_type = ?, allergies = ?,
                medical_conditions = ?, notes = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&child.name)
        .bind(child.birth_date.map(format_date))
        .bind(child.gender.map(|g| g.as_str()))
        .bind(child.height_cm)
        .bind(child.weight_kg)
        .bind(child.head_circumference_cm)
        .bind(&child.blood_type)
        .bind(serde_json::to_string(&child.allergies)?)
        .bind(&child.medical_conditions)
        .bind(&child.notes)
        .bind(format_utc(child.updated_at))
        .bind(&child.id)
        .bind(&child.user_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}
