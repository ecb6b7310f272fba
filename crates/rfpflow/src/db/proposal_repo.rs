//! Proposal repository: CRUD operations for the `proposals` table.

use rusqlite::{params, Row};
use uuid::Uuid;

use super::{json_column, now_timestamp, Database, DatabaseError};
use crate::ai::StructuredProposal;

#[derive(Debug, Clone, PartialEq)]
pub struct ProposalRow {
    pub id: String,
    pub vendor_id: String,
    pub rfp_id: String,
    pub raw_email: String,
    pub structured_proposal: StructuredProposal,
    pub ai_summary: Option<String>,
    pub score: Option<f64>,
    pub created_at: String,
}

impl ProposalRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            vendor_id: row.get("vendor_id")?,
            rfp_id: row.get("rfp_id")?,
            raw_email: row.get("raw_email")?,
            structured_proposal: json_column(row, "structured_proposal")?,
            ai_summary: row.get("ai_summary")?,
            score: row.get("score")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewProposal {
    pub vendor_id: String,
    pub rfp_id: String,
    pub raw_email: String,
    pub structured_proposal: StructuredProposal,
    pub score: Option<f64>,
}

/// Manual edit of a proposal. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProposalPatch {
    pub structured_proposal: Option<StructuredProposal>,
    pub ai_summary: Option<String>,
    pub score: Option<f64>,
}

/// Inserts a proposal with a fresh id and no summary.
pub fn insert(db: &Database, new: NewProposal) -> Result<ProposalRow, DatabaseError> {
    let payload = super::to_json("structured_proposal", &new.structured_proposal)?;
    let row = ProposalRow {
        id: Uuid::new_v4().to_string(),
        vendor_id: new.vendor_id,
        rfp_id: new.rfp_id,
        raw_email: new.raw_email,
        structured_proposal: new.structured_proposal,
        ai_summary: None,
        score: new.score,
        created_at: now_timestamp(),
    };

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO proposals (id, vendor_id, rfp_id, raw_email, structured_proposal,
             ai_summary, score, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.id,
                row.vendor_id,
                row.rfp_id,
                row.raw_email,
                payload,
                row.ai_summary,
                row.score,
                row.created_at,
            ],
        )?;
        Ok(())
    })?;

    Ok(row)
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<ProposalRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM proposals WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], ProposalRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// All proposals, newest first.
pub fn list_all(db: &Database) -> Result<Vec<ProposalRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM proposals ORDER BY created_at DESC")?;
        let rows = stmt
            .query_map([], ProposalRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn list_for_rfp(db: &Database, rfp_id: &str) -> Result<Vec<ProposalRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM proposals WHERE rfp_id = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map(params![rfp_id], ProposalRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Applies a patch and returns the updated row, or `None` if the id is unknown.
pub fn update(
    db: &Database,
    id: &str,
    patch: &ProposalPatch,
) -> Result<Option<ProposalRow>, DatabaseError> {
    let payload = patch
        .structured_proposal
        .as_ref()
        .map(|p| super::to_json("structured_proposal", p))
        .transpose()?;

    let changed = db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE proposals SET
                structured_proposal = COALESCE(?2, structured_proposal),
                ai_summary = COALESCE(?3, ai_summary),
                score = COALESCE(?4, score)
             WHERE id = ?1",
            params![id, payload, patch.ai_summary, patch.score],
        )?;
        Ok(changed)
    })?;

    if changed == 0 {
        return Ok(None);
    }
    find_by_id(db, id)
}

/// Writes a comparison score onto every proposal a vendor sent for an RFP.
/// Returns the number of rows touched.
pub fn update_score_summary(
    db: &Database,
    rfp_id: &str,
    vendor_id: &str,
    score: f64,
    summary: &str,
) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE proposals SET score = ?3, ai_summary = ?4
             WHERE rfp_id = ?1 AND vendor_id = ?2",
            params![rfp_id, vendor_id, score, summary],
        )?;
        Ok(changed)
    })
}
