use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::{ByteRecordsIntoIter, ReaderBuilder, StringRecord};
use tracing::{info, warn};

use crate::model::{IngestCounts, Observation, ObservationDate};

use super::*;

const SOURCE_EXTENSION: &str = "csv";
const FIELD_DELIMITER: u8 = b';';
const HEADER_LINES: u64 = 1;

pub(crate) fn discover_csv_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk_directory(data_dir, &mut files)?;
    Ok(files)
}

fn walk_directory(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    let mut children = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", entry.path().display()))?;
        children.push((entry.path(), file_type.is_dir()));
    }
    children.sort();

    for (path, _) in children.iter().filter(|(_, is_dir)| !is_dir) {
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
            .unwrap_or(false);
        if is_csv {
            files.push(path.clone());
        }
    }

    for (path, _) in children.iter().filter(|(_, is_dir)| *is_dir) {
        walk_directory(path, files)?;
    }

    Ok(())
}

struct OpenSource {
    path: PathBuf,
    date: ObservationDate,
    records: ByteRecordsIntoIter<BufReader<File>>,
}

/// Forward-only; exhausted after the first error.
pub(crate) struct ObservationStream<'a> {
    files: std::vec::IntoIter<PathBuf>,
    resolver: &'a DateResolver,
    accumulator: &'a mut MetadataAccumulator,
    current: Option<OpenSource>,
    current_dir: Option<PathBuf>,
    counts: IngestCounts,
    warnings: Vec<String>,
    failed: bool,
}

impl<'a> ObservationStream<'a> {
    pub(crate) fn new(
        files: Vec<PathBuf>,
        resolver: &'a DateResolver,
        accumulator: &'a mut MetadataAccumulator,
    ) -> Self {
        let counts = IngestCounts {
            files_discovered: files.len(),
            ..IngestCounts::default()
        };
        Self {
            files: files.into_iter(),
            resolver,
            accumulator,
            current: None,
            current_dir: None,
            counts,
            warnings: Vec::new(),
            failed: false,
        }
    }

    pub(crate) fn into_parts(self) -> (IngestCounts, Vec<String>) {
        (self.counts, self.warnings)
    }

    fn open_source(&mut self, path: PathBuf) -> Result<Option<OpenSource>> {
        let date = match self.resolver.resolve(&path) {
            Ok(date) => date,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    reason = %err,
                    "skipping file with unresolvable date"
                );
                self.warnings.push(format!("skipped {}: {err}", path.display()));
                self.counts.files_skipped += 1;
                return Ok(None);
            }
        };

        let dir = path.parent().map(Path::to_path_buf);
        if dir != self.current_dir {
            if let Some(dir) = &dir {
                info!(directory = %dir.display(), "ingesting directory");
            }
            self.current_dir = dir;
        }

        let file =
            File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
        let mut input = BufReader::new(file);
        // the header is physical line 1, even when blank; csv would skip blank lines
        let mut header = Vec::new();
        input
            .read_until(b'\n', &mut header)
            .with_context(|| format!("failed to read header of {}", path.display()))?;

        let reader = ReaderBuilder::new()
            .delimiter(FIELD_DELIMITER)
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(input);

        self.counts.files_processed += 1;
        Ok(Some(OpenSource {
            path,
            date,
            records: reader.into_byte_records(),
        }))
    }

    fn next_observation(&mut self) -> Option<Result<Observation>> {
        loop {
            if self.current.is_none() {
                let path = self.files.next()?;
                match self.open_source(path) {
                    Ok(source) => self.current = source,
                    Err(err) => return Some(Err(err)),
                }
                continue;
            }

            let source = self.current.as_mut()?;
            let record = match source.records.next() {
                None => {
                    self.current = None;
                    continue;
                }
                Some(Err(err)) => {
                    let path = source.path.display();
                    return Some(Err(err).with_context(|| format!("failed to read {path}")));
                }
                Some(Ok(record)) => record,
            };

            self.counts.records_read += 1;
            let line = record.position().map(|pos| pos.line()).unwrap_or_default() + HEADER_LINES;
            let record = StringRecord::from_byte_record_lossy(record);

            match ingest_record(&record, source.date, self.accumulator, &mut self.counts) {
                Ok(Some(observation)) => {
                    self.counts.observations_emitted += 1;
                    return Some(Ok(observation));
                }
                Ok(None) => continue,
                Err(err) => {
                    return Some(Err(err.context(format!(
                        "malformed record at {}:{line}",
                        source.path.display()
                    ))));
                }
            }
        }
    }
}

impl Iterator for ObservationStream<'_> {
    type Item = Result<Observation>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_observation();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
