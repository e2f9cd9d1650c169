use chrono::NaiveDate;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::date_util::parse_timestamp;
use crate::ingest::NewCall;
use crate::model::CallRecord;

const CALL_COLUMNS: &str = "id, call_date, call_duration, call_outcome, base_price, final_price, \
     is_negotiated, carrier_sentiment, load_origin, load_destination";

// ── Calls ──────────────────────────────────────────────────────────

/// Insert one call. `call_date` is stored exactly as given; normalization
/// happens in [`crate::ingest`]. `call_day` is derived here and stays NULL
/// when the date does not parse, so day filters never see such rows.
pub fn insert_call(conn: &Connection, call: &NewCall) -> Result<i64, rusqlite::Error> {
    let call_day = call
        .call_date
        .as_deref()
        .and_then(parse_timestamp)
        .map(|dt| dt.date().format("%Y-%m-%d").to_string());
    conn.execute(
        "INSERT INTO call_data (
            call_date, call_day, call_duration, call_outcome, base_price, final_price,
            is_negotiated, carrier_sentiment, load_origin, load_destination
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            call.call_date,
            call_day,
            call.call_duration,
            call.call_outcome,
            call.base_price,
            call.final_price,
            call.is_negotiated,
            call.carrier_sentiment,
            call.load_origin,
            call.load_destination,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetch calls whose day falls within `[start, end]`. Either bound may be
/// omitted; with neither, every row is returned. Rows without a parsed
/// `call_day` are excluded as soon as a bound is present.
pub fn fetch_calls(
    conn: &Connection,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<CallRecord>, rusqlite::Error> {
    let mut clauses = Vec::new();
    let mut args: Vec<String> = Vec::new();
    if let Some(start) = start {
        args.push(start.format("%Y-%m-%d").to_string());
        clauses.push(format!("call_day >= ?{}", args.len()));
    }
    if let Some(end) = end {
        args.push(end.format("%Y-%m-%d").to_string());
        clauses.push(format!("call_day <= ?{}", args.len()));
    }
    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let sql = format!("SELECT {CALL_COLUMNS} FROM call_data {where_clause} ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let bind: Vec<&dyn ToSql> = args.iter().map(|a| a as &dyn ToSql).collect();
    let calls = stmt
        .query_map(bind.as_slice(), row_to_call)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(calls)
}

fn row_to_call(row: &Row<'_>) -> Result<CallRecord, rusqlite::Error> {
    let id: i64 = row.get(0)?;
    let raw_date: Option<String> = row.get(1)?;
    let call_date = raw_date.as_deref().and_then(|s| {
        let parsed = parse_timestamp(s);
        if parsed.is_none() {
            log::warn!("call {id}: unparseable call_date '{s}', excluded from date views");
        }
        parsed
    });

    Ok(CallRecord {
        id,
        call_date,
        call_duration: row.get(2)?,
        call_outcome: row.get(3)?,
        base_price: row.get(4)?,
        final_price: row.get(5)?,
        is_negotiated: row.get(6)?,
        carrier_sentiment: row.get(7)?,
        load_origin: row.get(8)?,
        load_destination: row.get(9)?,
    })
}

pub fn count_calls(conn: &Connection) -> Result<i64, rusqlite::Error> {
    conn.query_row("SELECT COUNT(*) FROM call_data", [], |row| row.get(0))
}

/// Earliest and latest call day present, as `YYYY-MM-DD` strings.
pub fn call_date_bounds(conn: &Connection) -> Result<Option<(String, String)>, rusqlite::Error> {
    let (min, max): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(call_day), MAX(call_day) FROM call_data",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(min.zip(max))
}

/// Row counts per stored outcome text, most frequent first. Null outcomes
/// are reported under `None`.
pub fn outcome_counts(conn: &Connection) -> Result<Vec<(Option<String>, i64)>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT call_outcome, COUNT(*) AS n FROM call_data
         GROUP BY call_outcome ORDER BY n DESC, call_outcome",
    )?;
    let counts = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(counts)
}

// ── App config ─────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO app_config (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let entries = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}
