use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::date_util::{format_timestamp, parse_timestamp};
use crate::error::{Error, Result};
use crate::storage::{repository, Database};

/// Years a call date is expected to fall in. Dates outside are still stored
/// but logged, since one stray year widens every daily trend to match.
const PLAUSIBLE_YEARS: RangeInclusive<i32> = 1990..=2100;

/// A call as submitted for ingestion. Field names match the stored columns.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewCall {
    #[serde(default)]
    pub call_date: Option<String>,
    pub call_duration: f64,
    #[serde(default)]
    pub call_outcome: Option<String>,
    #[serde(default)]
    pub base_price: Option<f64>,
    #[serde(default)]
    pub final_price: Option<f64>,
    #[serde(default)]
    pub is_negotiated: Option<bool>,
    #[serde(default)]
    pub carrier_sentiment: Option<String>,
    #[serde(default)]
    pub load_origin: Option<String>,
    #[serde(default)]
    pub load_destination: Option<String>,
}

/// Outcome of one ingestion batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub inserted: usize,
    /// Rows stored with a `call_date` that could not be parsed.
    pub unparseable_dates: usize,
}

/// Parse a JSON array of calls, a single JSON object (which may span
/// several lines), or newline-delimited JSON objects.
pub fn parse_records(text: &str) -> Result<Vec<NewCall>> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    if let Ok(call) = serde_json::from_str::<NewCall>(trimmed) {
        return Ok(vec![call]);
    }

    let mut calls = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let call: NewCall = serde_json::from_str(line)
            .map_err(|e| Error::Parse(format!("line {}: {e}", lineno + 1)))?;
        calls.push(call);
    }
    Ok(calls)
}

/// Validate a batch and normalize parseable dates to the storage format.
///
/// Any invalid row rejects the whole batch. Unparseable dates are kept
/// verbatim and counted; they only drop out of date-keyed metrics.
pub fn prepare_batch(calls: Vec<NewCall>) -> Result<(Vec<NewCall>, usize)> {
    let mut unparseable = 0;
    let mut prepared = Vec::with_capacity(calls.len());

    for (index, mut call) in calls.into_iter().enumerate() {
        if !call.call_duration.is_finite() || call.call_duration < 0.0 {
            return Err(Error::InvalidRecord {
                index,
                message: format!("call_duration must be a non-negative number, got {}", call.call_duration),
            });
        }
        for (name, price) in [("base_price", call.base_price), ("final_price", call.final_price)] {
            if price.is_some_and(|p| !p.is_finite()) {
                return Err(Error::InvalidRecord {
                    index,
                    message: format!("{name} must be finite"),
                });
            }
        }

        call.call_date = match call.call_date.take() {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => match parse_timestamp(&raw) {
                Some(dt) => {
                    if !is_plausible_call_date(&dt) {
                        log::warn!(
                            "record {index}: call_date '{raw}' is outside {PLAUSIBLE_YEARS:?}; check for a mistyped year"
                        );
                    }
                    Some(format_timestamp(&dt))
                }
                None => {
                    log::warn!("record {index}: unparseable call_date '{raw}' stored as-is");
                    unparseable += 1;
                    Some(raw)
                }
            },
            None => None,
        };
        prepared.push(call);
    }

    Ok((prepared, unparseable))
}

pub fn is_plausible_call_date(dt: &NaiveDateTime) -> bool {
    PLAUSIBLE_YEARS.contains(&dt.year())
}

/// Validate and insert a batch in a single transaction.
pub async fn ingest_calls(db: &Database, calls: Vec<NewCall>) -> Result<IngestReport> {
    let (prepared, unparseable_dates) = prepare_batch(calls)?;
    if prepared.is_empty() {
        return Ok(IngestReport::default());
    }

    let inserted = db
        .writer()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for call in &prepared {
                repository::insert_call(&tx, call)?;
            }
            tx.commit()?;
            Ok::<usize, rusqlite::Error>(prepared.len())
        })
        .await?;

    log::info!("ingested {inserted} calls ({unparseable_dates} with unparseable dates)");
    Ok(IngestReport {
        inserted,
        unparseable_dates,
    })
}
