use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use crate::cli::{DateMode, IngestArgs};
use crate::model::{IngestCounts, IngestPaths, IngestRunManifest, StoreTotals};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

use super::*;

#[derive(Debug, Clone)]
pub(crate) struct IngestOutcome {
    pub(crate) counts: IngestCounts,
    pub(crate) totals: StoreTotals,
    pub(crate) warnings: Vec<String>,
}

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    info!(
        data_dir = %args.data_dir.display(),
        db_path = %args.db_path.display(),
        date_mode = args.date_mode.as_str(),
        run_id = %run_id,
        "starting ingest"
    );

    let outcome = ingest(&args.data_dir, &args.db_path, args.date_mode)?;

    if let Some(manifest_path) = &args.manifest_path {
        let manifest = IngestRunManifest {
            manifest_version: 1,
            run_id: run_id.clone(),
            db_schema_version: DB_SCHEMA_VERSION.to_string(),
            status: "completed".to_string(),
            started_at,
            finished_at: now_utc_string(),
            date_mode: args.date_mode.as_str().to_string(),
            paths: IngestPaths {
                data_dir: args.data_dir.display().to_string(),
                db_path: args.db_path.display().to_string(),
            },
            counts: outcome.counts.clone(),
            totals: outcome.totals.clone(),
            warnings: outcome.warnings.clone(),
        };
        write_json_pretty(manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote ingest run manifest");
    }

    let counts = &outcome.counts;
    info!(
        files = counts.files_processed,
        files_skipped = counts.files_skipped,
        records = counts.records_read,
        sentinel_navs = counts.sentinel_navs,
        unparsable_navs = counts.unparsable_navs,
        zero_navs = counts.zero_navs,
        invalid_isins = counts.invalid_isins,
        securities_rejected = counts.securities_rejected,
        "ingest statistics"
    );
    info!(
        schemes = outcome.totals.schemes_total,
        securities = outcome.totals.securities_total,
        observations = outcome.totals.observations_total,
        "ingest completed"
    );

    Ok(())
}

pub(crate) fn ingest(data_dir: &Path, db_path: &Path, mode: DateMode) -> Result<IngestOutcome> {
    if !data_dir.is_dir() {
        bail!("data directory not found: {}", data_dir.display());
    }

    reset_database_file(db_path)?;

    let mut connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection, mode)?;

    load(&mut connection, data_dir, mode)
}

pub(crate) fn load(
    connection: &mut Connection,
    data_dir: &Path,
    mode: DateMode,
) -> Result<IngestOutcome> {
    let files = discover_csv_files(data_dir)?;
    info!(files = files.len(), "discovered source files");

    let resolver = DateResolver::new(mode)?;
    let mut accumulator = MetadataAccumulator::default();

    let tx = connection.transaction()?;

    let (mut counts, mut warnings) = {
        let mut stream = ObservationStream::new(files, &resolver, &mut accumulator);
        insert_observations(&tx, mode, &mut stream)?;
        stream.into_parts()
    };

    info!(
        observations = counts.observations_emitted,
        schemes = accumulator.scheme_count(),
        securities = accumulator.security_count(),
        "observations loaded, flushing metadata"
    );

    counts.schemes_inserted = insert_schemes(&tx, &accumulator)?;
    let security_stats = insert_securities(&tx, &accumulator)?;
    counts.securities_inserted = security_stats.inserted;
    counts.securities_rejected = security_stats.rejected;

    warnings.extend(
        accumulator
            .rejected_isins()
            .map(|isin| format!("invalid ISIN: {isin}")),
    );

    create_indexes(&tx, mode)?;
    write_metadata(&tx, mode)?;

    let totals = StoreTotals {
        schemes_total: count_rows(&tx, "schemes")?,
        securities_total: count_rows(&tx, "securities")?,
        observations_total: count_rows(&tx, mode.observation_table())?,
    };

    tx.commit().context("failed to commit ingest transaction")?;

    Ok(IngestOutcome {
        counts,
        totals,
        warnings,
    })
}
