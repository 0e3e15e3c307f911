//! Connection bootstrap for the note database.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Apply connection settings and the schema step before handing out the
//!   connection.
//!
//! # Invariants
//! - Returned connections already hold `note_table` at the expected version.

use super::schema::{prepare_schema, SchemaOutcome};
use super::{DbError, DbResult};
use crate::context::DatabaseConfig;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

/// Opens (or creates) the database file at `path`.
///
/// # Side effects
/// - Creates missing parent directories.
/// - Emits `db_open` events with duration and status.
pub(crate) fn open_file(
    path: &Path,
    config: &DatabaseConfig,
) -> DbResult<(Connection, SchemaOutcome)> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let opened = connect_file(path, config);
    log_open_result("file", started_at, opened)
}

/// Opens a private in-memory database.
pub(crate) fn open_memory(config: &DatabaseConfig) -> DbResult<(Connection, SchemaOutcome)> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let opened = Connection::open_in_memory()
        .map_err(DbError::from)
        .and_then(|conn| bootstrap(conn, config));
    log_open_result("memory", started_at, opened)
}

fn connect_file(path: &Path, config: &DatabaseConfig) -> DbResult<(Connection, SchemaOutcome)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    bootstrap(conn, config)
}

fn bootstrap(
    mut conn: Connection,
    config: &DatabaseConfig,
) -> DbResult<(Connection, SchemaOutcome)> {
    conn.busy_timeout(config.busy_timeout)?;
    let outcome = prepare_schema(&mut conn, config)?;
    Ok((conn, outcome))
}

fn log_open_result(
    mode: &str,
    started_at: Instant,
    opened: DbResult<(Connection, SchemaOutcome)>,
) -> DbResult<(Connection, SchemaOutcome)> {
    match &opened {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={} duration_ms={}",
            mode,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={} duration_ms={} error={}",
            mode,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    opened
}
