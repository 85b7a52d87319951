//! SQLite persistence.
//!
//! Runtime defaults:
//! - `journal_mode = WAL` so readers are not blocked by the writer
//! - `busy_timeout = 5s` to ride out short lock contention
//! - `foreign_keys = ON` so label rows follow their issue

pub mod gateway;
pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

pub use gateway::SqliteGateway;

/// Busy timeout applied to every connection.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the issue database, apply runtime pragmas, and migrate
/// the schema to the latest version.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or opening,
/// configuring, or migrating the database fails.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create database directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open issue database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply schema migrations")?;

    Ok(conn)
}

/// Fresh in-memory database with the full schema.
///
/// # Errors
///
/// Returns an error if SQLite cannot allocate the database or a migration
/// fails.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("enable foreign keys")?;
    migrations::migrate(&mut conn).context("apply schema migrations")?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_BUSY_TIMEOUT, open_database, open_in_memory};
    use crate::db::migrations;

    #[test]
    fn open_database_sets_wal_busy_timeout_and_fk() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("nested").join("issues.db");
        let conn = open_database(&path).expect("open issue db");

        let journal_mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .expect("query journal_mode");
        assert_eq!(journal_mode.to_ascii_lowercase(), "wal");

        let busy_timeout_ms: u64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .expect("query busy_timeout");
        assert_eq!(u128::from(busy_timeout_ms), DEFAULT_BUSY_TIMEOUT.as_millis());

        let foreign_keys: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .expect("query foreign_keys");
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn both_openers_run_migrations() {
        let conn = open_in_memory().expect("open in-memory db");
        assert_eq!(
            migrations::current_schema_version(&conn).expect("schema version"),
            migrations::LATEST_SCHEMA_VERSION
        );
    }
}
