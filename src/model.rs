use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// One outbound carrier call, as retrieved from the store.
///
/// Categorical fields keep the stored text verbatim. A non-null outcome that
/// is not one of the known [`CallOutcome`] values still counts as a valid
/// call, it just never matches a category.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CallRecord {
    pub id: i64,
    /// `None` when the stored value is missing or unparseable.
    pub call_date: Option<NaiveDateTime>,
    /// Seconds.
    pub call_duration: f64,
    pub call_outcome: Option<String>,
    pub base_price: Option<f64>,
    pub final_price: Option<f64>,
    pub is_negotiated: Option<bool>,
    pub carrier_sentiment: Option<String>,
    pub load_origin: Option<String>,
    pub load_destination: Option<String>,
}

impl CallRecord {
    /// Date-only view of `call_date`, used as the key for every trend.
    pub fn call_day(&self) -> Option<NaiveDate> {
        self.call_date.map(|dt| dt.date())
    }

    /// A call counts toward volume metrics only once it has an outcome.
    pub fn is_valid_call(&self) -> bool {
        self.call_outcome.is_some()
    }

    pub fn outcome(&self) -> Option<CallOutcome> {
        self.call_outcome.as_deref().and_then(CallOutcome::from_key)
    }

    pub fn sentiment(&self) -> Option<CarrierSentiment> {
        self.carrier_sentiment
            .as_deref()
            .and_then(CarrierSentiment::from_key)
    }

    /// Percent change from `base_price` to `final_price`.
    ///
    /// `None` when either price is missing, the base is zero, or the result
    /// is not finite.
    pub fn price_increase_pct(&self) -> Option<f64> {
        let base = self.base_price?;
        let final_price = self.final_price?;
        if base == 0.0 {
            return None;
        }
        let pct = (final_price - base) / base * 100.0;
        pct.is_finite().then_some(pct)
    }
}

/// A closed set of labels that can be counted per day.
pub trait Category: Copy + Ord + Serialize + 'static {
    /// Every member, in display order.
    const ALL: &'static [Self];

    /// Stored / serialized key.
    fn key(&self) -> &'static str;

    /// Human-readable label for reports.
    fn label(&self) -> &'static str;

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    SuccessRateBooked,
    RateTooLow,
    NoMatchingLoads,
    IneligibleMcNumber,
}

impl Category for CallOutcome {
    const ALL: &'static [Self] = &[
        CallOutcome::SuccessRateBooked,
        CallOutcome::RateTooLow,
        CallOutcome::NoMatchingLoads,
        CallOutcome::IneligibleMcNumber,
    ];

    fn key(&self) -> &'static str {
        match self {
            CallOutcome::SuccessRateBooked => "success_rate_booked",
            CallOutcome::RateTooLow => "rate_too_low",
            CallOutcome::NoMatchingLoads => "no_matching_loads",
            CallOutcome::IneligibleMcNumber => "ineligible_mc_number",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CallOutcome::SuccessRateBooked => "Successful Calls",
            CallOutcome::RateTooLow => "Rate Too Low",
            CallOutcome::NoMatchingLoads => "No Matching Loads",
            CallOutcome::IneligibleMcNumber => "Ineligible Driver",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CarrierSentiment {
    #[serde(rename = "carrier_sentiment_positive")]
    Positive,
    #[serde(rename = "carrier_sentiment_negative")]
    Negative,
    #[serde(rename = "carrier_sentiment_neutral")]
    Neutral,
}

impl Category for CarrierSentiment {
    const ALL: &'static [Self] = &[
        CarrierSentiment::Positive,
        CarrierSentiment::Negative,
        CarrierSentiment::Neutral,
    ];

    fn key(&self) -> &'static str {
        match self {
            CarrierSentiment::Positive => "carrier_sentiment_positive",
            CarrierSentiment::Negative => "carrier_sentiment_negative",
            CarrierSentiment::Neutral => "carrier_sentiment_neutral",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CarrierSentiment::Positive => "Positive",
            CarrierSentiment::Negative => "Negative",
            CarrierSentiment::Neutral => "Neutral",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priced(base: Option<f64>, final_price: Option<f64>) -> CallRecord {
        CallRecord {
            base_price: base,
            final_price,
            ..Default::default()
        }
    }

    #[test]
    fn test_outcome_keys_roundtrip() {
        for outcome in CallOutcome::ALL {
            assert_eq!(CallOutcome::from_key(outcome.key()), Some(*outcome));
            assert_eq!(
                serde_json::to_value(outcome).unwrap(),
                serde_json::Value::String(outcome.key().to_string())
            );
        }
        assert_eq!(CallOutcome::from_key("hung_up"), None);
    }

    #[test]
    fn test_sentiment_keys_roundtrip() {
        for sentiment in CarrierSentiment::ALL {
            assert_eq!(CarrierSentiment::from_key(sentiment.key()), Some(*sentiment));
            assert_eq!(
                serde_json::to_value(sentiment).unwrap(),
                serde_json::Value::String(sentiment.key().to_string())
            );
        }
        assert_eq!(CarrierSentiment::from_key("positive"), None);
    }

    #[test]
    fn test_unknown_outcome_is_still_valid_call() {
        let record = CallRecord {
            call_outcome: Some("callback_requested".into()),
            ..Default::default()
        };
        assert!(record.is_valid_call());
        assert_eq!(record.outcome(), None);
    }

    #[test]
    fn test_price_increase_pct() {
        assert_eq!(priced(Some(1000.0), Some(1100.0)).price_increase_pct(), Some(10.0));
        assert_eq!(priced(Some(1000.0), Some(900.0)).price_increase_pct(), Some(-10.0));
        assert_eq!(priced(Some(0.0), Some(900.0)).price_increase_pct(), None);
        assert_eq!(priced(None, Some(900.0)).price_increase_pct(), None);
        assert_eq!(priced(Some(1000.0), None).price_increase_pct(), None);
        assert_eq!(priced(Some(f64::MIN_POSITIVE), Some(f64::MAX)).price_increase_pct(), None);
    }
}
