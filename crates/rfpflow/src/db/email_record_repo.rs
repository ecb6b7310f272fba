//! Outbound email records: one row per RFP sent (or attempted) to a vendor.
//!
//! The `sent` rows double as the outbound history the correlator falls back
//! on when an inbound reply carries no RFP identifier.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::rfp_repo::RfpRow;
use super::{format_timestamp, json_column, now_timestamp, Database, DatabaseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailStatus {
    Pending,
    Sent,
    Failed,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Pending => "pending",
            EmailStatus::Sent => "sent",
            EmailStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(EmailStatus::Pending),
            "sent" => Some(EmailStatus::Sent),
            "failed" => Some(EmailStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailRecordRow {
    pub id: String,
    pub rfp_id: String,
    pub vendor_id: String,
    pub recipient_email: String,
    pub subject: String,
    pub email_body: String,
    pub status: EmailStatus,
    pub error_message: Option<String>,
    pub sent_at: Option<String>,
    pub created_at: String,
}

impl EmailRecordRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let status: String = row.get("status")?;
        Ok(Self {
            id: row.get("id")?,
            rfp_id: row.get("rfp_id")?,
            vendor_id: row.get("vendor_id")?,
            recipient_email: row.get("recipient_email")?,
            subject: row.get("subject")?,
            email_body: row.get("email_body")?,
            status: EmailStatus::parse(&status).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(
                    row.as_ref().column_index("status").unwrap_or_default(),
                    format!("status={}", status),
                    rusqlite::types::Type::Text,
                )
            })?,
            error_message: row.get("error_message")?,
            sent_at: row.get("sent_at")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Fields supplied by the mailer for a new outbound record.
#[derive(Debug, Clone)]
pub struct NewEmailRecord<'a> {
    pub rfp_id: &'a str,
    pub vendor_id: &'a str,
    pub recipient_email: &'a str,
    pub subject: &'a str,
    pub email_body: &'a str,
}

/// A sent record joined with the RFP it carried.
#[derive(Debug, Clone)]
pub struct SentContext {
    pub record: EmailRecordRow,
    pub rfp: RfpRow,
}

pub fn insert_pending(
    db: &Database,
    new: &NewEmailRecord<'_>,
) -> Result<EmailRecordRow, DatabaseError> {
    let row = EmailRecordRow {
        id: Uuid::new_v4().to_string(),
        rfp_id: new.rfp_id.to_string(),
        vendor_id: new.vendor_id.to_string(),
        recipient_email: new.recipient_email.to_string(),
        subject: new.subject.to_string(),
        email_body: new.email_body.to_string(),
        status: EmailStatus::Pending,
        error_message: None,
        sent_at: None,
        created_at: now_timestamp(),
    };

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO email_records (id, rfp_id, vendor_id, recipient_email, subject,
             email_body, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.id,
                row.rfp_id,
                row.vendor_id,
                row.recipient_email,
                row.subject,
                row.email_body,
                row.status.as_str(),
                row.created_at,
            ],
        )?;
        Ok(())
    })?;

    Ok(row)
}

pub fn mark_sent(db: &Database, id: &str, at: DateTime<Utc>) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE email_records SET status = ?2, sent_at = ?3, error_message = NULL
             WHERE id = ?1",
            params![id, EmailStatus::Sent.as_str(), format_timestamp(at)],
        )?;
        Ok(())
    })
}

pub fn mark_failed(db: &Database, id: &str, error: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE email_records SET status = ?2, error_message = ?3 WHERE id = ?1",
            params![id, EmailStatus::Failed.as_str(), error],
        )?;
        Ok(())
    })
}

/// Sent records for a vendor since `since`, newest first, each with its RFP.
pub fn recent_sent_for_vendor(
    db: &Database,
    vendor_id: &str,
    since: DateTime<Utc>,
    limit: u32,
) -> Result<Vec<SentContext>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT e.*, r.description_raw AS rfp_description_raw,
                    r.structured_data AS rfp_structured_data,
                    r.is_draft AS rfp_is_draft, r.created_at AS rfp_created_at
             FROM email_records e
             JOIN rfps r ON r.id = e.rfp_id
             WHERE e.vendor_id = ?1 AND e.status = ?2
               AND e.sent_at IS NOT NULL AND e.sent_at >= ?3
             ORDER BY e.sent_at DESC, e.created_at DESC, e.id DESC
             LIMIT ?4",
        )?;
        let rows = stmt
            .query_map(
                params![
                    vendor_id,
                    EmailStatus::Sent.as_str(),
                    format_timestamp(since),
                    limit
                ],
                |row| {
                    let record = EmailRecordRow::from_row(row)?;
                    let rfp = RfpRow {
                        id: record.rfp_id.clone(),
                        description_raw: row.get("rfp_description_raw")?,
                        structured_data: json_column(row, "rfp_structured_data")?,
                        is_draft: row.get("rfp_is_draft")?,
                        created_at: row.get("rfp_created_at")?,
                    };
                    Ok(SentContext { record, rfp })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// All records, newest first.
pub fn list_all(db: &Database) -> Result<Vec<EmailRecordRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM email_records ORDER BY created_at DESC")?;
        let rows = stmt
            .query_map([], EmailRecordRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn list_for_rfp(db: &Database, rfp_id: &str) -> Result<Vec<EmailRecordRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM email_records WHERE rfp_id = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map(params![rfp_id], EmailRecordRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
