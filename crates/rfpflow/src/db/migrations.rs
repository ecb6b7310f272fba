//! Versioned schema for the four tables.
//!
//! The highest applied version is kept in `_migrations`.

use rusqlite::{params, Connection};

use super::error::DatabaseError;
use super::now_timestamp;

/// A single migration definition.
struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

/// All migrations in order. Each is applied at most once.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_vendors_table",
        sql: include_str!("sql/001_create_vendors.sql"),
    },
    Migration {
        version: 2,
        description: "create_rfps_table",
        sql: include_str!("sql/002_create_rfps.sql"),
    },
    Migration {
        version: 3,
        description: "create_email_records_table",
        sql: include_str!("sql/003_create_email_records.sql"),
    },
    Migration {
        version: 4,
        description: "create_proposals_table",
        sql: include_str!("sql/004_create_proposals.sql"),
    },
];

fn applied_version(conn: &Connection) -> Result<u32, DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );",
    )?;
    let version = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |r| {
        r.get(0)
    })?;
    Ok(version)
}

/// Schema change and bookkeeping row commit together.
fn apply(conn: &Connection, migration: &Migration) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)
        .map_err(|e| DatabaseError::Migration {
            version: migration.version,
            reason: e.to_string(),
        })?;
    tx.execute(
        "INSERT INTO _migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        params![migration.version, migration.description, now_timestamp()],
    )?;
    tx.commit()?;
    Ok(())
}

/// Applies every migration newer than the recorded version and returns how
/// many ran.
pub fn run_all(conn: &Connection) -> Result<usize, DatabaseError> {
    let current = applied_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();

    for migration in &pending {
        log::info!("Applying schema v{} ({})", migration.version, migration.description);
        apply(conn, migration)?;
    }

    if !pending.is_empty() {
        log::debug!("Schema now at v{}", current as usize + pending.len());
    }
    Ok(pending.len())
}
