use anyhow::{Context, Result};
use csv::StringRecord;
use tracing::debug;

use crate::model::{IngestCounts, Observation, ObservationDate, SecurityType};

use super::*;

const FIELD_SCHEME_CODE: usize = 0;
const FIELD_SCHEME_NAME: usize = 1;
const FIELD_ISIN_PAYOUT: usize = 2;
const FIELD_ISIN_GROWTH: usize = 3;
const FIELD_NAV: usize = 4;

pub(crate) const NAV_SENTINELS: [&str; 7] =
    ["-", "#N/A", "#DIV/0!", "N.A.", "NA", "B.C.", "B. C."];

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum NavValue {
    Present(f64),
    Sentinel,
    Unparsable,
    // zero is suppressed like a missing value
    Zero,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedRecord<'a> {
    pub(crate) scheme_code: i64,
    pub(crate) scheme_name: &'a str,
    pub(crate) isin_payout: &'a str,
    pub(crate) isin_growth: &'a str,
    pub(crate) nav: NavValue,
}

pub(crate) fn sanitize_nav(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|ch| !matches!(ch, ',' | '`' | '-'))
        .collect::<String>()
        .trim()
        .to_string()
}

pub(crate) fn parse_nav(raw: &str) -> NavValue {
    let trimmed = raw.trim();
    if NAV_SENTINELS.contains(&trimmed) {
        return NavValue::Sentinel;
    }

    match sanitize_nav(trimmed).parse::<f64>() {
        Ok(value) if !value.is_finite() => NavValue::Unparsable,
        Ok(value) if value == 0.0 => NavValue::Zero,
        Ok(value) => NavValue::Present(value),
        Err(_) => NavValue::Unparsable,
    }
}

pub(crate) fn parse_record(record: &StringRecord) -> Result<Option<ParsedRecord<'_>>> {
    if record.len() <= 1 {
        return Ok(None);
    }

    let field = move |index: usize| record.get(index).unwrap_or("");
    let raw_code = field(FIELD_SCHEME_CODE).trim();
    let scheme_code = raw_code
        .parse::<i64>()
        .with_context(|| format!("invalid scheme code: {raw_code:?}"))?;

    Ok(Some(ParsedRecord {
        scheme_code,
        scheme_name: field(FIELD_SCHEME_NAME),
        isin_payout: field(FIELD_ISIN_PAYOUT),
        isin_growth: field(FIELD_ISIN_GROWTH),
        nav: parse_nav(field(FIELD_NAV)),
    }))
}

pub(crate) fn ingest_record(
    record: &StringRecord,
    date: ObservationDate,
    accumulator: &mut MetadataAccumulator,
    counts: &mut IngestCounts,
) -> Result<Option<Observation>> {
    let Some(parsed) = parse_record(record)? else {
        counts.records_skipped += 1;
        return Ok(None);
    };

    accumulator.record_scheme(parsed.scheme_code, parsed.scheme_name);
    for (raw, security_type) in [
        (parsed.isin_payout, SecurityType::Payout),
        (parsed.isin_growth, SecurityType::Growth),
    ] {
        if accumulator.record_isin(raw, parsed.scheme_code, security_type) == IsinOutcome::Rejected
        {
            counts.invalid_isins += 1;
        }
    }

    match parsed.nav {
        NavValue::Present(nav) => Ok(Some(Observation {
            scheme_code: parsed.scheme_code,
            date,
            nav,
        })),
        NavValue::Sentinel => {
            counts.sentinel_navs += 1;
            Ok(None)
        }
        NavValue::Zero => {
            counts.zero_navs += 1;
            Ok(None)
        }
        NavValue::Unparsable => {
            debug!(
                scheme_code = parsed.scheme_code,
                nav = %record.get(FIELD_NAV).unwrap_or(""),
                "unparsable NAV"
            );
            counts.unparsable_navs += 1;
            Ok(None)
        }
    }
}
