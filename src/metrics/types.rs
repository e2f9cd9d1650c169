use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::model::{CallOutcome, CarrierSentiment, Category};

/// One step of the running mean over date-sorted valid calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationPoint {
    pub call_date: Option<NaiveDateTime>,
    pub cumulative_avg_duration: f64,
}

/// Call volume and duration: total valid calls plus the expanding mean
/// of call duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VolumeMetrics {
    pub total_calls: u64,
    pub cumulative_avg_duration: Vec<DurationPoint>,
}

impl VolumeMetrics {
    /// Mean duration over every valid call (the last point of the series).
    pub fn latest_avg_duration(&self) -> Option<f64> {
        self.cumulative_avg_duration
            .last()
            .map(|p| p.cumulative_avg_duration)
    }
}

/// Share of all records (0.0–1.0) carrying each outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OutcomeShares {
    pub success_rate_booked: f64,
    pub rate_too_low: f64,
    pub no_matching_loads: f64,
    pub ineligible_mc_number: f64,
}

impl OutcomeShares {
    pub fn get(&self, outcome: CallOutcome) -> f64 {
        match outcome {
            CallOutcome::SuccessRateBooked => self.success_rate_booked,
            CallOutcome::RateTooLow => self.rate_too_low,
            CallOutcome::NoMatchingLoads => self.no_matching_loads,
            CallOutcome::IneligibleMcNumber => self.ineligible_mc_number,
        }
    }

    pub(crate) fn set(&mut self, outcome: CallOutcome, share: f64) {
        let slot = match outcome {
            CallOutcome::SuccessRateBooked => &mut self.success_rate_booked,
            CallOutcome::RateTooLow => &mut self.rate_too_low,
            CallOutcome::NoMatchingLoads => &mut self.no_matching_loads,
            CallOutcome::IneligibleMcNumber => &mut self.ineligible_mc_number,
        };
        *slot = share;
    }

    pub fn sum(&self) -> f64 {
        CallOutcome::ALL.iter().map(|&o| self.get(o)).sum()
    }
}

/// Per-day counts for every member of a category set.
///
/// Serializes flat: `{"date": "2024-01-01", "<key>": n, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow<C: Category> {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counts: BTreeMap<C, u64>,
}

impl<C: Category> TrendRow<C> {
    /// A row with every category present and zeroed.
    pub fn zeroed(date: NaiveDate) -> Self {
        Self {
            date,
            counts: C::ALL.iter().map(|&c| (c, 0)).collect(),
        }
    }

    pub fn count(&self, category: C) -> u64 {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutcomeMetrics {
    pub current_metrics: OutcomeShares,
    pub trends: Vec<TrendRow<CallOutcome>>,
}

/// Average price increase (percent) on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceIncreasePoint {
    pub date: NaiveDate,
    pub price_increase: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NegotiationMetrics {
    /// Percentage (0–100) of calls with a known negotiation flag that were negotiated.
    pub negotiation_rate: f64,
    /// Only days with at least one priced call; gaps are not filled.
    pub price_increase_trends: Vec<PriceIncreasePoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SentimentMetrics {
    pub trends: Vec<TrendRow<CarrierSentiment>>,
}

/// All four bundles computed over one fetched record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub range_key: String,
    pub record_count: usize,
    pub calls: VolumeMetrics,
    pub outcomes: OutcomeMetrics,
    pub negotiation: NegotiationMetrics,
    pub sentiment: SentimentMetrics,
}
