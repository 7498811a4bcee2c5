use anyhow::{Context, Result};
use rusqlite::{Connection, ErrorCode, params};
use tracing::warn;

use crate::cli::DateMode;
use crate::model::Observation;

use super::*;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SecurityInsertStats {
    pub(crate) inserted: usize,
    pub(crate) rejected: usize,
}

pub(crate) fn insert_observations<I>(
    connection: &Connection,
    mode: DateMode,
    observations: I,
) -> Result<usize>
where
    I: Iterator<Item = Result<Observation>>,
{
    let sql = match mode {
        DateMode::Calendar => "INSERT INTO nav(scheme_code, date, nav) VALUES(?1, ?2, ?3)",
        DateMode::EpochOffset => {
            "INSERT INTO funds(scheme_code, days_since_epoch, nav) VALUES(?1, ?2, ?3)"
        }
    };
    let mut statement = connection
        .prepare_cached(sql)
        .context("failed to prepare observation insert")?;

    let mut inserted = 0;
    for observation in observations {
        let observation = observation?;
        statement.execute(params![
            observation.scheme_code,
            observation.date,
            observation.nav
        ])?;
        inserted += 1;
    }
    Ok(inserted)
}

pub(crate) fn insert_schemes(
    connection: &Connection,
    accumulator: &MetadataAccumulator,
) -> Result<usize> {
    let mut statement = connection
        .prepare_cached("INSERT INTO schemes(scheme_code, scheme_name) VALUES(?1, ?2)")
        .context("failed to prepare scheme insert")?;

    let mut inserted = 0;
    for scheme in accumulator.schemes() {
        statement
            .execute(params![scheme.scheme_code, scheme.scheme_name])
            .with_context(|| format!("failed to insert scheme {}", scheme.scheme_code))?;
        inserted += 1;
    }
    Ok(inserted)
}

pub(crate) fn insert_securities(
    connection: &Connection,
    accumulator: &MetadataAccumulator,
) -> Result<SecurityInsertStats> {
    let mut statement = connection
        .prepare_cached("INSERT INTO securities(isin, type, scheme_code) VALUES(?1, ?2, ?3)")
        .context("failed to prepare security insert")?;

    let mut stats = SecurityInsertStats::default();
    for security in accumulator.securities() {
        let result = statement.execute(params![
            security.isin,
            security.security_type.as_i64(),
            security.scheme_code
        ]);
        match result {
            Ok(_) => stats.inserted += 1,
            Err(err) if is_unique_violation(&err) => {
                warn!(isin = %security.isin, error = %err, "duplicate ISIN not inserted");
                stats.rejected += 1;
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to insert security {}", security.isin));
            }
        }
    }
    Ok(stats)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
