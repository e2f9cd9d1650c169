pub mod date_util;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod query;
pub mod storage;

pub use error::{Error, Result};
pub use ingest::{IngestReport, NewCall};
pub use metrics::{
    negotiation_metrics, outcome_metrics, sentiment_metrics, volume_and_duration_metrics,
    DashboardReport, NegotiationMetrics, OutcomeMetrics, SentimentMetrics, VolumeMetrics,
};
pub use model::{CallOutcome, CallRecord, CarrierSentiment, Category};
pub use query::DateRange;
pub use storage::Database;

use serde::Serialize;
use storage::repository;

/// Config key holding the range used when a command gives none.
pub const DEFAULT_RANGE_KEY: &str = "default_range";

/// Snapshot of what the store holds.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub total_records: i64,
    pub first_call_day: Option<String>,
    pub last_call_day: Option<String>,
    pub outcome_counts: Vec<(Option<String>, i64)>,
}

/// Main entry point: a call store plus the metric derivations over it.
///
/// Nothing is cached between calls; every report fetches a fresh record set
/// and hands it explicitly to each bundle.
pub struct CallMetrics {
    db: Database,
}

impl CallMetrics {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ── Retrieval & metrics ────────────────────────────────────────

    pub async fn fetch(&self, range: &DateRange) -> Result<Vec<CallRecord>> {
        self.db.fetch_calls(range.start, range.end).await
    }

    /// Fetch once and derive every bundle from that snapshot.
    pub async fn report(&self, range: &DateRange) -> Result<DashboardReport> {
        let records = self.fetch(range).await?;
        Ok(metrics::build_report(range.to_key(), &records))
    }

    /// The persisted default range, or every record when none is set.
    pub async fn default_range(&self) -> Result<DateRange> {
        match self.config_get(DEFAULT_RANGE_KEY).await? {
            Some(expr) => DateRange::parse(&expr),
            None => Ok(DateRange::all()),
        }
    }

    // ── Ingestion ──────────────────────────────────────────────────

    pub async fn ingest(&self, calls: Vec<NewCall>) -> Result<IngestReport> {
        ingest::ingest_calls(&self.db, calls).await
    }

    // ── Status ─────────────────────────────────────────────────────

    pub async fn status(&self) -> Result<StoreStatus> {
        let status = self
            .db
            .reader()
            .call(|conn| {
                let total_records = repository::count_calls(conn)?;
                let bounds = repository::call_date_bounds(conn)?;
                let outcome_counts = repository::outcome_counts(conn)?;
                let (first_call_day, last_call_day) = match bounds {
                    Some((first, last)) => (Some(first), Some(last)),
                    None => (None, None),
                };
                Ok::<StoreStatus, rusqlite::Error>(StoreStatus {
                    total_records,
                    first_call_day,
                    last_call_day,
                    outcome_counts,
                })
            })
            .await?;
        Ok(status)
    }

    // ── Config commands ────────────────────────────────────────────

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        self.db
            .reader()
            .call({
                let key = key.to_string();
                move |conn| repository::get_config(conn, &key)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Set a config value. `default_range` is validated before it is stored.
    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        if key == DEFAULT_RANGE_KEY {
            DateRange::parse(value)?;
        }
        self.db
            .writer()
            .call({
                let key = key.to_string();
                let value = value.to_string();
                move |conn| repository::set_config(conn, &key, &value)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        self.db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}
