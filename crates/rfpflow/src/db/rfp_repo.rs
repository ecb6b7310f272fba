//! RFP store: CRUD operations for the `rfps` table.

use rusqlite::{params, Row};
use uuid::Uuid;

use super::{json_column, now_timestamp, Database, DatabaseError};
use crate::ai::RfpStructure;

#[derive(Debug, Clone, PartialEq)]
pub struct RfpRow {
    pub id: String,
    pub description_raw: String,
    pub structured_data: RfpStructure,
    pub is_draft: bool,
    pub created_at: String,
}

impl RfpRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            description_raw: row.get("description_raw")?,
            structured_data: json_column(row, "structured_data")?,
            is_draft: row.get("is_draft")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Category from the structured payload, if the LLM produced one.
    pub fn category(&self) -> Option<&str> {
        self.structured_data.category.as_deref()
    }
}

pub fn insert(
    db: &Database,
    description_raw: &str,
    structured: &RfpStructure,
    is_draft: bool,
) -> Result<RfpRow, DatabaseError> {
    let payload = super::to_json("structured_data", structured)?;
    let row = RfpRow {
        id: Uuid::new_v4().to_string(),
        description_raw: description_raw.to_string(),
        structured_data: structured.clone(),
        is_draft,
        created_at: now_timestamp(),
    };

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO rfps (id, description_raw, structured_data, is_draft, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![row.id, row.description_raw, payload, row.is_draft, row.created_at],
        )?;
        Ok(())
    })?;

    Ok(row)
}

/// Looks an RFP up by id, ignoring ASCII case so that ids quoted in
/// upper case by mail clients still resolve.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<RfpRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM rfps WHERE lower(id) = lower(?1)")?;
        let mut rows = stmt.query_map(params![id.trim()], RfpRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// All RFPs, newest first.
pub fn list(db: &Database) -> Result<Vec<RfpRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM rfps ORDER BY created_at DESC")?;
        let rows = stmt
            .query_map([], RfpRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Clears the draft flag. Returns whether the row was a draft.
pub fn mark_draft_as_sent(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE rfps SET is_draft = 0 WHERE id = ?1 AND is_draft = 1",
            params![id],
        )?;
        Ok(changed > 0)
    })
}
