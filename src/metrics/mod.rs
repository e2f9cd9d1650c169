pub mod trends;
pub mod types;

pub use trends::{daily_price_increase, densify_and_count};
pub use types::*;

use crate::model::{CallOutcome, CallRecord, Category};

/// Total valid calls and the running mean of their duration.
///
/// Valid calls are ordered by `call_date` with a stable sort (undated calls
/// last), so calls sharing a timestamp keep their input order. Point *i* is
/// the mean duration of the first *i* calls in that order.
pub fn volume_and_duration_metrics(records: &[CallRecord]) -> VolumeMetrics {
    let mut valid: Vec<&CallRecord> = records.iter().filter(|r| r.is_valid_call()).collect();
    valid.sort_by_key(|r| (r.call_date.is_none(), r.call_date));

    let mut sum = 0.0;
    let mut cumulative_avg_duration = Vec::with_capacity(valid.len());
    for (i, record) in valid.iter().enumerate() {
        sum += record.call_duration;
        cumulative_avg_duration.push(DurationPoint {
            call_date: record.call_date,
            cumulative_avg_duration: sum / (i + 1) as f64,
        });
    }

    log::debug!(
        "volume: {} of {} records are valid calls",
        valid.len(),
        records.len()
    );

    VolumeMetrics {
        total_calls: valid.len() as u64,
        cumulative_avg_duration,
    }
}

/// Outcome shares over all records plus zero-filled daily outcome counts.
///
/// Records without an outcome still count in the share denominator, so the
/// shares sum to at most 1.
pub fn outcome_metrics(records: &[CallRecord]) -> OutcomeMetrics {
    let mut current_metrics = OutcomeShares::default();
    if !records.is_empty() {
        let total = records.len() as f64;
        for &outcome in CallOutcome::ALL {
            let matching = records
                .iter()
                .filter(|r| r.outcome() == Some(outcome))
                .count();
            current_metrics.set(outcome, matching as f64 / total);
        }
    }

    OutcomeMetrics {
        current_metrics,
        trends: densify_and_count(records, CallRecord::outcome),
    }
}

/// Negotiation rate (percent of known flags) and sparse daily price increase.
pub fn negotiation_metrics(records: &[CallRecord]) -> NegotiationMetrics {
    let (known, negotiated) = records
        .iter()
        .filter_map(|r| r.is_negotiated)
        .fold((0u64, 0u64), |(known, yes), flag| (known + 1, yes + flag as u64));

    let negotiation_rate = if known > 0 {
        negotiated as f64 / known as f64 * 100.0
    } else {
        0.0
    };

    NegotiationMetrics {
        negotiation_rate,
        price_increase_trends: daily_price_increase(records),
    }
}

/// Zero-filled daily carrier sentiment counts.
pub fn sentiment_metrics(records: &[CallRecord]) -> SentimentMetrics {
    SentimentMetrics {
        trends: densify_and_count(records, CallRecord::sentiment),
    }
}

/// Compute every bundle over the same record set.
pub fn build_report(range_key: impl Into<String>, records: &[CallRecord]) -> DashboardReport {
    DashboardReport {
        range_key: range_key.into(),
        record_count: records.len(),
        calls: volume_and_duration_metrics(records),
        outcomes: outcome_metrics(records),
        negotiation: negotiation_metrics(records),
        sentiment: sentiment_metrics(records),
    }
}
