use chrono::NaiveDate;
use rusqlite::ToSql;
use rusqlite::types::ToSqlOutput;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheme {
    pub scheme_code: i64,
    pub scheme_name: String,
}

/// Which ISIN column of the disclosure a security came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SecurityType {
    Payout,
    Growth,
}

impl SecurityType {
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Payout => 0,
            Self::Growth => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Security {
    pub isin: String,
    pub security_type: SecurityType,
    pub scheme_code: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationDate {
    Calendar(NaiveDate),
    EpochOffset(i64),
}

impl ToSql for ObservationDate {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Calendar(date) => Ok(ToSqlOutput::from(date.format("%Y-%m-%d").to_string())),
            Self::EpochOffset(days) => Ok(ToSqlOutput::from(*days)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub scheme_code: i64,
    pub date: ObservationDate,
    pub nav: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestCounts {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub records_read: usize,
    pub records_skipped: usize,
    pub observations_emitted: usize,
    pub sentinel_navs: usize,
    pub unparsable_navs: usize,
    pub zero_navs: usize,
    pub invalid_isins: usize,
    pub schemes_inserted: usize,
    pub securities_inserted: usize,
    pub securities_rejected: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestPaths {
    pub data_dir: String,
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreTotals {
    pub schemes_total: i64,
    pub securities_total: i64,
    pub observations_total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: String,
    pub date_mode: String,
    pub paths: IngestPaths,
    pub counts: IngestCounts,
    pub totals: StoreTotals,
    pub warnings: Vec<String>,
}
