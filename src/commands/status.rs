use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tracing::{info, warn};

use crate::cli::{DateMode, StatusArgs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DatabaseStatus {
    pub(crate) schema_version: String,
    pub(crate) ingested_at: String,
    pub(crate) date_mode: DateMode,
    pub(crate) schemes: i64,
    pub(crate) securities: i64,
    pub(crate) observations: i64,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = &args.db_path;
    info!(db_path = %db_path.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    let status = read_status(&conn)?;

    info!(
        schema_version = %status.schema_version,
        ingested_at = %status.ingested_at,
        date_mode = status.date_mode.as_str(),
        "loaded database metadata"
    );
    info!(
        path = %db_path.display(),
        schemes = status.schemes,
        securities = status.securities,
        observations = status.observations,
        "database status"
    );

    Ok(())
}

pub(crate) fn read_status(conn: &Connection) -> Result<DatabaseStatus> {
    let date_mode = read_metadata(conn, "date_mode")?
        .as_deref()
        .and_then(DateMode::parse)
        .unwrap_or(DateMode::Calendar);

    Ok(DatabaseStatus {
        schema_version: read_metadata(conn, "db_schema_version")?.unwrap_or_default(),
        ingested_at: read_metadata(conn, "ingested_at")?.unwrap_or_default(),
        date_mode,
        schemes: query_count(conn, "schemes").unwrap_or(0),
        securities: query_count(conn, "securities").unwrap_or(0),
        observations: query_count(conn, date_mode.observation_table()).unwrap_or(0),
    })
}

fn read_metadata(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()
        .with_context(|| format!("failed to read metadata key {key}"))?;
    Ok(value)
}

fn query_count(conn: &Connection, table: &str) -> Result<i64> {
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_status_counts_the_table_named_by_date_mode() {
        let conn = Connection::open_in_memory().expect("in-memory DB should open");
        conn.execute_batch(
            "
            CREATE TABLE metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL);
            CREATE TABLE schemes (scheme_code INTEGER PRIMARY KEY, scheme_name TEXT);
            CREATE TABLE securities (isin TEXT UNIQUE, type INTEGER, scheme_code INTEGER);
            CREATE TABLE funds (days_since_epoch INTEGER, scheme_code INTEGER, nav FLOAT);
            INSERT INTO metadata VALUES ('db_schema_version', '1.0.0'), ('date_mode', 'epoch-offset');
            INSERT INTO schemes VALUES (100045, 'Alpha Fund');
            INSERT INTO securities VALUES ('INF123456789', 0, 100045);
            INSERT INTO funds VALUES (10, 100045, 12.5), (11, 100045, 12.75);
            ",
        )
        .expect("seed rows should insert");

        let status = read_status(&conn).expect("status should read");
        assert_eq!(status.date_mode, DateMode::EpochOffset);
        assert_eq!(status.schema_version, "1.0.0");
        assert_eq!(status.ingested_at, "");
        assert_eq!(status.schemes, 1);
        assert_eq!(status.securities, 1);
        assert_eq!(status.observations, 2);
    }
}
