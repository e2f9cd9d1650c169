use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;

use crate::date_util::{last_day_of_month, quarter_of};
use crate::error::{Error, Result};

static RE_QUARTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-Q([1-4])$").unwrap());
static RE_MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());
static RE_ROLLING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)[dD]$").unwrap());

/// An inclusive call-day window used to bound retrieval. Either side may be
/// open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Parse a range expression relative to the local date.
    ///
    /// Supported formats:
    /// - `all` — no bounds
    /// - `2024` — calendar year
    /// - `2024-Q1` — quarter
    /// - `2024-01` — month
    /// - `2024-01-15` — single day
    /// - `2024-01-01..2024-01-31` — explicit span; either side may be empty
    /// - `30d` — rolling last N days, today included
    /// - `ytd` / `qtd` / `mtd` — start of year / quarter / month through today
    pub fn parse(s: &str) -> Result<Self> {
        Self::parse_at(s, chrono::Local::now().date_naive())
    }

    /// Parse with an explicit "today", for relative forms.
    pub fn parse_at(s: &str, today: NaiveDate) -> Result<Self> {
        let s = s.trim();

        match s.to_lowercase().as_str() {
            "" | "all" => return Ok(Self::all()),
            "ytd" => return Ok(Self::between(ymd(today.year(), 1, 1)?, today)),
            "qtd" => {
                let first_month = (quarter_of(today) as u32 - 1) * 3 + 1;
                return Ok(Self::between(ymd(today.year(), first_month, 1)?, today));
            }
            "mtd" => return Ok(Self::between(ymd(today.year(), today.month(), 1)?, today)),
            _ => {}
        }

        if let Some((from, to)) = s.split_once("..") {
            let range = Self {
                start: parse_bound(from)?,
                end: parse_bound(to)?,
            };
            if let (Some(start), Some(end)) = (range.start, range.end) {
                if end < start {
                    return Err(Error::RangeParse(format!("end before start: {s}")));
                }
            }
            return Ok(range);
        }

        if let Some(caps) = RE_ROLLING.captures(s) {
            let days: i64 = caps[1]
                .parse()
                .map_err(|_| Error::RangeParse(format!("invalid day count: {s}")))?;
            if days == 0 {
                return Err(Error::RangeParse(format!("rolling window must be at least 1 day: {s}")));
            }
            let start = Duration::try_days(days - 1)
                .and_then(|span| today.checked_sub_signed(span))
                .ok_or_else(|| Error::RangeParse(format!("rolling window too large: {s}")))?;
            return Ok(Self::between(start, today));
        }

        if s.len() == 4 {
            if let Ok(year) = s.parse::<i32>() {
                return Ok(Self::between(ymd(year, 1, 1)?, ymd(year, 12, 31)?));
            }
        }

        if let Some(caps) = RE_QUARTER.captures(s) {
            let year: i32 = caps[1]
                .parse()
                .map_err(|_| Error::RangeParse(format!("invalid year: {s}")))?;
            let q: u32 = caps[2]
                .parse()
                .map_err(|_| Error::RangeParse(format!("invalid quarter: {s}")))?;
            let first_month = (q - 1) * 3 + 1;
            return Ok(Self::between(
                ymd(year, first_month, 1)?,
                month_end(year, first_month + 2)?,
            ));
        }

        if let Some(caps) = RE_MONTH.captures(s) {
            let year: i32 = caps[1]
                .parse()
                .map_err(|_| Error::RangeParse(format!("invalid year: {s}")))?;
            let month: u32 = caps[2]
                .parse()
                .map_err(|_| Error::RangeParse(format!("invalid month: {s}")))?;
            if (1..=12).contains(&month) {
                return Ok(Self::between(ymd(year, month, 1)?, month_end(year, month)?));
            }
        }

        if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::between(day, day));
        }

        Err(Error::RangeParse(format!("unrecognized range: {s}")))
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Canonical key, e.g. `2024-01-01..2024-01-31` or `all`.
    pub fn to_key(&self) -> String {
        let fmt = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        if self.is_unbounded() {
            "all".to_string()
        } else {
            format!("{}..{}", fmt(self.start), fmt(self.end))
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_key())
    }
}

fn parse_bound(s: &str) -> Result<Option<NaiveDate>> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| Error::RangeParse(format!("invalid date: {s}")))
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::RangeParse(format!("invalid date: {year}-{month:02}-{day:02}")))
}

fn month_end(year: i32, month: u32) -> Result<NaiveDate> {
    last_day_of_month(year, month)
        .ok_or_else(|| Error::RangeParse(format!("invalid month: {year}-{month:02}")))
}
