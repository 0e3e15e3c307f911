//! `note_table` schema creation and version checks.
//!
//! # Invariants
//! - `PRAGMA user_version = 0` marks a file that has never been initialized.
//! - Table rebuilds and version bumps commit in one transaction.
//! - When seeding is enabled, a fresh table keeps version 0 until the seed
//!   rows commit; the seed transaction stamps the version.

use crate::context::{DatabaseConfig, MigrationPolicy};
use crate::db::{DbError, DbResult};
use log::{info, warn};
use rusqlite::Connection;

pub const NOTE_TABLE: &str = "note_table";

const CREATE_NOTE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS note_table (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    priority INTEGER NOT NULL
);";

const DROP_NOTE_TABLE_SQL: &str = "DROP TABLE IF EXISTS note_table;";

/// How the schema step left the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
    /// Fresh file; the table was created.
    Created,
    /// Stored version matched; existing rows kept.
    Opened,
    /// Stored version differed; the table was dropped and recreated empty.
    Recreated { from: u32 },
}

impl SchemaOutcome {
    fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Opened => "opened",
            Self::Recreated { .. } => "recreated",
        }
    }
}

/// Reads the schema version stored in the database header.
pub fn stored_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Ensures `note_table` exists at the configured schema version.
pub(crate) fn prepare_schema(
    conn: &mut Connection,
    config: &DatabaseConfig,
) -> DbResult<SchemaOutcome> {
    let expected = expected_version(config);
    let current = stored_version(conn)?;

    let outcome = if current == 0 {
        let stamp = (!config.seed_on_create).then_some(expected);
        rebuild_table(conn, stamp, false)?;
        SchemaOutcome::Created
    } else if current == expected {
        conn.execute_batch(CREATE_NOTE_TABLE_SQL)?;
        SchemaOutcome::Opened
    } else {
        match config.migration_policy {
            MigrationPolicy::Destructive => {
                warn!(
                    "event=db_schema module=db status=destructive from_version={} to_version={}",
                    current, expected
                );
                rebuild_table(conn, Some(expected), true)?;
                SchemaOutcome::Recreated { from: current }
            }
            MigrationPolicy::FailOnMismatch => {
                return Err(DbError::SchemaVersionMismatch {
                    db_version: current,
                    expected,
                });
            }
        }
    };

    info!(
        "event=db_schema module=db status=ok outcome={} version={}",
        outcome.label(),
        expected
    );
    Ok(outcome)
}

/// Schema version this config expects on disk.
pub(crate) fn expected_version(config: &DatabaseConfig) -> u32 {
    // Version 0 is what SQLite reports for an untouched file.
    config.schema_version.max(1)
}

/// Stamps `version` into the database header.
pub(crate) fn write_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
}

fn rebuild_table(
    conn: &mut Connection,
    version: Option<u32>,
    drop_existing: bool,
) -> DbResult<()> {
    let tx = conn.transaction()?;
    if drop_existing {
        tx.execute_batch(DROP_NOTE_TABLE_SQL)?;
    }
    tx.execute_batch(CREATE_NOTE_TABLE_SQL)?;
    if let Some(version) = version {
        write_version(&tx, version)?;
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{prepare_schema, stored_version, SchemaOutcome};
    use crate::context::{DatabaseConfig, MigrationPolicy};
    use crate::db::DbError;
    use rusqlite::Connection;

    fn row_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM note_table;", [], |row| row.get(0))
            .unwrap()
    }

    fn unseeded() -> DatabaseConfig {
        DatabaseConfig {
            seed_on_create: false,
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn fresh_connection_creates_table_and_sets_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        let outcome = prepare_schema(&mut conn, &unseeded()).unwrap();
        assert_eq!(outcome, SchemaOutcome::Created);
        assert_eq!(stored_version(&conn).unwrap(), 1);
        assert_eq!(row_count(&conn), 0);
    }

    #[test]
    fn fresh_table_awaiting_seed_stays_unversioned() {
        let mut conn = Connection::open_in_memory().unwrap();
        let outcome = prepare_schema(&mut conn, &DatabaseConfig::default()).unwrap();
        assert_eq!(outcome, SchemaOutcome::Created);
        assert_eq!(stored_version(&conn).unwrap(), 0);

        let again = prepare_schema(&mut conn, &DatabaseConfig::default()).unwrap();
        assert_eq!(again, SchemaOutcome::Created);
    }

    #[test]
    fn matching_version_keeps_rows() {
        let mut conn = Connection::open_in_memory().unwrap();
        prepare_schema(&mut conn, &unseeded()).unwrap();
        conn.execute(
            "INSERT INTO note_table (title, description, priority) VALUES ('a', 'b', 1);",
            [],
        )
        .unwrap();

        let outcome = prepare_schema(&mut conn, &DatabaseConfig::default()).unwrap();
        assert_eq!(outcome, SchemaOutcome::Opened);
        assert_eq!(row_count(&conn), 1);
    }

    #[test]
    fn mismatch_with_strict_policy_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        prepare_schema(&mut conn, &unseeded()).unwrap();

        let config = DatabaseConfig {
            schema_version: 2,
            migration_policy: MigrationPolicy::FailOnMismatch,
            ..DatabaseConfig::default()
        };
        let err = prepare_schema(&mut conn, &config).unwrap_err();
        assert!(matches!(
            err,
            DbError::SchemaVersionMismatch {
                db_version: 1,
                expected: 2
            }
        ));
        assert_eq!(stored_version(&conn).unwrap(), 1);
    }
}
