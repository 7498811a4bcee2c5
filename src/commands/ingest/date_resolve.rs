use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use regex::Regex;

use crate::cli::DateMode;
use crate::model::ObservationDate;

const EPOCH_YEAR: i32 = 2006;

pub(crate) struct DateResolver {
    mode: DateMode,
    epoch: NaiveDate,
    year_pattern: Regex,
    month_pattern: Regex,
    day_pattern: Regex,
}

impl DateResolver {
    pub(crate) fn new(mode: DateMode) -> Result<Self> {
        Ok(Self {
            mode,
            epoch: NaiveDate::from_ymd_opt(EPOCH_YEAR, 1, 1).context("invalid epoch date")?,
            year_pattern: Regex::new(r"^[0-9]{4}$").context("failed to compile year regex")?,
            month_pattern: Regex::new(r"^[0-9]{2}$").context("failed to compile month regex")?,
            day_pattern: Regex::new(r"^([0-9]{2})").context("failed to compile day regex")?,
        })
    }

    pub(crate) fn resolve(&self, path: &Path) -> Result<ObservationDate> {
        let date = self.resolve_calendar_date(path)?;
        Ok(match self.mode {
            DateMode::Calendar => ObservationDate::Calendar(date),
            DateMode::EpochOffset => ObservationDate::EpochOffset(self.epoch_offset(date)),
        })
    }

    pub(crate) fn resolve_calendar_date(&self, path: &Path) -> Result<NaiveDate> {
        let file_name = component_name(Some(path)).context("missing file name")?;
        let month_dir = path.parent();
        let month = component_name(month_dir).context("missing month directory")?;
        let year = component_name(month_dir.and_then(Path::parent))
            .context("missing year directory")?;

        if !self.year_pattern.is_match(year) {
            bail!("year directory is not a 4-digit number: {year}");
        }
        if !self.month_pattern.is_match(month) {
            bail!("month directory is not a 2-digit number: {month}");
        }
        let day = self
            .day_pattern
            .captures(file_name)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
            .with_context(|| format!("file name does not start with a 2-digit day: {file_name}"))?;

        let year: i32 = year.parse().context("invalid year")?;
        let month: u32 = month.parse().context("invalid month")?;
        let day: u32 = day.parse().context("invalid day")?;

        NaiveDate::from_ymd_opt(year, month, day)
            .with_context(|| format!("not a calendar date: {year:04}-{month:02}-{day:02}"))
    }

    // negative before the epoch
    pub(crate) fn epoch_offset(&self, date: NaiveDate) -> i64 {
        date.signed_duration_since(self.epoch).num_days()
    }
}

fn component_name(path: Option<&Path>) -> Option<&str> {
    path.and_then(Path::file_name).and_then(|name| name.to_str())
}
