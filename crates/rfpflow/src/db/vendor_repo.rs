//! Vendor directory: CRUD operations for the `vendors` table.

use rusqlite::{params, Row};
use uuid::Uuid;

use super::{now_timestamp, Database, DatabaseError};

#[derive(Debug, Clone, PartialEq)]
pub struct VendorRow {
    pub id: String,
    pub name: String,
    /// Always stored trimmed and lowercased.
    pub email: String,
    /// Free-form JSON text.
    pub metadata: Option<String>,
    pub created_at: String,
}

impl VendorRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            metadata: row.get("metadata")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Canonical form of an email address for storage and lookup.
pub fn normalize_email(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Inserts a vendor with a fresh id. Fails on a duplicate email.
pub fn insert(
    db: &Database,
    name: &str,
    email: &str,
    metadata: Option<&serde_json::Value>,
) -> Result<VendorRow, DatabaseError> {
    let metadata = metadata
        .map(|m| super::to_json("metadata", m))
        .transpose()?;
    let row = VendorRow {
        id: Uuid::new_v4().to_string(),
        name: name.trim().to_string(),
        email: normalize_email(email),
        metadata,
        created_at: now_timestamp(),
    };

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO vendors (id, name, email, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![row.id, row.name, row.email, row.metadata, row.created_at],
        )?;
        Ok(())
    })?;

    Ok(row)
}

/// Exact lookup on the stored (normalized) address.
pub fn find_by_email(db: &Database, email: &str) -> Result<Option<VendorRow>, DatabaseError> {
    find_one(db, "SELECT * FROM vendors WHERE email = ?1", email)
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<VendorRow>, DatabaseError> {
    find_one(db, "SELECT * FROM vendors WHERE id = ?1", id)
}

fn find_one(db: &Database, sql: &str, key: &str) -> Result<Option<VendorRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query_map(params![key], VendorRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// All vendors ordered by name.
pub fn list(db: &Database) -> Result<Vec<VendorRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM vendors ORDER BY name ASC, created_at ASC")?;
        let rows = stmt
            .query_map([], VendorRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    #[test]
    fn test_insert_normalizes_email() {
        let db = test_db();
        let vendor = insert(&db, "Acme Corp", "  Sales@ACME.test ", None).unwrap();
        assert_eq!(vendor.email, "sales@acme.test");

        let found = find_by_email(&db, "sales@acme.test").unwrap().unwrap();
        assert_eq!(found, vendor);
    }

    #[test]
    fn test_find_by_email_is_exact() {
        let db = test_db();
        insert(&db, "Acme Corp", "sales@acme.test", None).unwrap();
        assert!(find_by_email(&db, "Sales@Acme.test").unwrap().is_none());
        assert!(find_by_email(&db, "other@acme.test").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let db = test_db();
        insert(&db, "Acme", "sales@acme.test", None).unwrap();
        let result = insert(&db, "Acme Again", "SALES@acme.test", None);
        assert!(matches!(result, Err(DatabaseError::Sqlite(_))));
    }

    #[test]
    fn test_metadata_and_list() {
        let db = test_db();
        let meta = serde_json::json!({"region": "EU"});
        let zeta = insert(&db, "Zeta Supplies", "z@zeta.test", Some(&meta)).unwrap();
        insert(&db, "Acme", "a@acme.test", None).unwrap();

        let vendors = list(&db).unwrap();
        assert_eq!(vendors.len(), 2);
        assert_eq!(vendors[0].name, "Acme");

        let found = find_by_id(&db, &zeta.id).unwrap().unwrap();
        assert_eq!(found.metadata.as_deref(), Some(r#"{"region":"EU"}"#));
    }
}
