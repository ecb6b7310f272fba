//! Seed data for integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};

use rfpflow::ai::RfpStructure;
use rfpflow::db::email_record_repo::{self, NewEmailRecord};
use rfpflow::db::rfp_repo::{self, RfpRow};
use rfpflow::db::vendor_repo::{self, VendorRow};
use rfpflow::db::Database;

pub fn seed_vendor(db: &Database, name: &str, email: &str) -> VendorRow {
    vendor_repo::insert(db, name, email, None).unwrap()
}

pub fn seed_rfp(db: &Database, description: &str, category: &str) -> RfpRow {
    let structured = RfpStructure {
        category: Some(category.to_string()),
        ..Default::default()
    };
    rfp_repo::insert(db, description, &structured, false).unwrap()
}

/// Records an outbound RFP email marked sent `days_ago` days in the past.
pub fn seed_sent(db: &Database, rfp: &RfpRow, vendor: &VendorRow, days_ago: i64) {
    let record = email_record_repo::insert_pending(
        db,
        &NewEmailRecord {
            rfp_id: &rfp.id,
            vendor_id: &vendor.id,
            recipient_email: &vendor.email,
            subject: "RFP Request",
            email_body: "<p>RFP</p>",
        },
    )
    .unwrap();
    email_record_repo::mark_sent(db, &record.id, Utc::now() - Duration::days(days_ago)).unwrap();
}

/// Builds a minimal single-part RFC 822 message.
pub fn raw_email(from: &str, subject: &str, body: &str) -> Vec<u8> {
    format!(
        "From: {}\r\nTo: rfp@example.com\r\nSubject: {}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n",
        from, subject, body
    )
    .into_bytes()
}
