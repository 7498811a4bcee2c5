use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

use crate::cli::DateMode;
use crate::util::{now_utc_string, remove_file_if_exists};

use super::*;

pub(crate) fn reset_database_file(db_path: &Path) -> Result<()> {
    let mut removed = remove_file_if_exists(db_path)?;
    for suffix in ["-wal", "-shm"] {
        let mut side = db_path.as_os_str().to_os_string();
        side.push(suffix);
        removed |= remove_file_if_exists(&PathBuf::from(side))?;
    }
    if removed {
        info!(path = %db_path.display(), "removed existing database");
    }
    Ok(())
}

pub(crate) fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    // nav rows land before their schemes
    connection
        .pragma_update(None, "foreign_keys", "OFF")
        .context("failed to set foreign_keys=OFF")?;
    Ok(())
}

// plain CREATE: a leftover schema is an error
pub(crate) fn ensure_schema(connection: &Connection, mode: DateMode) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE schemes (
          scheme_code INTEGER PRIMARY KEY,
          scheme_name TEXT
        );

        CREATE TABLE securities (
          isin TEXT UNIQUE,
          type INTEGER,
          scheme_code INTEGER,
          FOREIGN KEY(scheme_code) REFERENCES schemes(scheme_code)
        );
        ",
    )?;

    let observation_sql = match mode {
        DateMode::Calendar => {
            "
            CREATE TABLE nav (
              scheme_code INTEGER,
              date TEXT,
              nav FLOAT,
              FOREIGN KEY(scheme_code) REFERENCES schemes(scheme_code)
            );

            CREATE VIEW nav_by_isin (isin, date, nav) AS
              SELECT S.isin, N.date, N.nav FROM nav N
              JOIN securities S ON N.scheme_code = S.scheme_code
              ORDER BY N.date DESC;
            "
        }
        DateMode::EpochOffset => {
            "
            CREATE TABLE funds (
              days_since_epoch INTEGER,
              scheme_code INTEGER,
              nav FLOAT,
              FOREIGN KEY(scheme_code) REFERENCES schemes(scheme_code)
            );

            CREATE VIEW nav_by_isin (isin, days_since_epoch, nav) AS
              SELECT S.isin, F.days_since_epoch, F.nav FROM funds F
              JOIN securities S ON F.scheme_code = S.scheme_code
              ORDER BY F.days_since_epoch DESC;
            "
        }
    };
    connection
        .execute_batch(observation_sql)
        .with_context(|| format!("failed to create {} table", mode.observation_table()))?;

    Ok(())
}

pub(crate) fn create_indexes(connection: &Connection, mode: DateMode) -> Result<()> {
    let observation_index = match mode {
        DateMode::Calendar => "CREATE INDEX idx_nav_scheme_date ON nav(scheme_code, date);",
        DateMode::EpochOffset => {
            "CREATE INDEX idx_funds_scheme_day ON funds(scheme_code, days_since_epoch);"
        }
    };
    connection
        .execute_batch(observation_index)
        .context("failed to index observations")?;
    connection
        .execute_batch("CREATE INDEX idx_securities_scheme ON securities(scheme_code);")
        .context("failed to index securities")?;
    Ok(())
}

pub(crate) fn write_metadata(connection: &Connection, mode: DateMode) -> Result<()> {
    let entries = [
        ("db_schema_version", DB_SCHEMA_VERSION.to_string()),
        ("date_mode", mode.as_str().to_string()),
        ("ingested_at", now_utc_string()),
    ];
    for (key, value) in entries {
        connection.execute(
            "INSERT INTO metadata(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            [key, value.as_str()],
        )?;
    }
    Ok(())
}

pub(crate) fn count_rows(connection: &Connection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    connection
        .query_row(&sql, [], |row| row.get(0))
        .with_context(|| format!("failed to count rows in {table}"))
}
