use std::collections::BTreeMap;

use crate::date_util::days_inclusive;
use crate::model::{CallRecord, Category};

use super::types::{PriceIncreasePoint, TrendRow};

/// Count records per calendar day and category over the full observed span.
///
/// The span runs from the earliest to the latest `call_day` among all dated
/// records, whether or not they match a category. Every day in the span gets
/// exactly one row with every category present, zero-filled. Undated records
/// are skipped; no dated records means no rows.
pub fn densify_and_count<C, F>(records: &[CallRecord], category_of: F) -> Vec<TrendRow<C>>
where
    C: Category,
    F: Fn(&CallRecord) -> Option<C>,
{
    let dated: Vec<_> = records
        .iter()
        .filter_map(|r| r.call_day().map(|day| (day, r)))
        .collect();

    let (Some(min), Some(max)) = (
        dated.iter().map(|(day, _)| *day).min(),
        dated.iter().map(|(day, _)| *day).max(),
    ) else {
        return Vec::new();
    };

    let mut rows: Vec<TrendRow<C>> = days_inclusive(min, max).map(TrendRow::zeroed).collect();

    for (day, record) in &dated {
        let Some(category) = category_of(*record) else {
            continue;
        };
        let idx = (*day - min).num_days() as usize;
        if let Some(count) = rows[idx].counts.get_mut(&category) {
            *count += 1;
        }
    }

    rows
}

/// Mean price increase per day, one point per day that has priced calls.
pub fn daily_price_increase(records: &[CallRecord]) -> Vec<PriceIncreasePoint> {
    let mut by_day: BTreeMap<_, (f64, u64)> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records {
        match (record.call_day(), record.price_increase_pct()) {
            (Some(day), Some(pct)) => {
                let entry = by_day.entry(day).or_insert((0.0, 0));
                entry.0 += pct;
                entry.1 += 1;
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::debug!("{skipped} records without a usable date or price excluded from price trends");
    }

    by_day
        .into_iter()
        .map(|(date, (sum, n))| PriceIncreasePoint {
            date,
            price_increase: sum / n as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CallOutcome, CarrierSentiment};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn call(day: Option<NaiveDate>, outcome: Option<&str>) -> CallRecord {
        CallRecord {
            call_date: day.map(|d| d.and_hms_opt(12, 0, 0).unwrap()),
            call_outcome: outcome.map(String::from),
            ..Default::default()
        }
    }

    fn priced(day: NaiveDate, base: f64, final_price: f64) -> CallRecord {
        CallRecord {
            call_date: day.and_hms_opt(9, 0, 0),
            base_price: Some(base),
            final_price: Some(final_price),
            ..Default::default()
        }
    }

    #[test]
    fn test_densify_empty() {
        let rows = densify_and_count::<CallOutcome, _>(&[], |r| r.outcome());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_densify_all_undated() {
        let records = vec![call(None, Some("rate_too_low")), call(None, None)];
        let rows = densify_and_count(&records, |r| r.outcome());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_densify_fills_gaps_with_zero() {
        let records = vec![
            call(Some(date(2024, 1, 5)), Some("rate_too_low")),
            call(Some(date(2024, 1, 1)), Some("success_rate_booked")),
            call(Some(date(2024, 1, 5)), Some("rate_too_low")),
        ];
        let rows = densify_and_count(&records, |r| r.outcome());

        assert_eq!(rows.len(), 5);
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates.first(), Some(&date(2024, 1, 1)));
        assert_eq!(dates.last(), Some(&date(2024, 1, 5)));
        assert!(dates.windows(2).all(|w| w[1] - w[0] == chrono::Duration::days(1)));

        assert_eq!(rows[0].count(CallOutcome::SuccessRateBooked), 1);
        assert_eq!(rows[4].count(CallOutcome::RateTooLow), 2);
        for row in &rows[1..4] {
            assert_eq!(row.total(), 0);
            assert_eq!(row.counts.len(), CallOutcome::ALL.len());
        }
    }

    #[test]
    fn test_densify_span_includes_uncategorized_dates() {
        // Only the first record matches a category, but the later date still
        // extends the span.
        let records = vec![
            call(Some(date(2024, 3, 1)), Some("no_matching_loads")),
            call(Some(date(2024, 3, 3)), None),
            call(Some(date(2024, 3, 4)), Some("something_else")),
        ];
        let rows = densify_and_count(&records, |r| r.outcome());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].count(CallOutcome::NoMatchingLoads), 1);
        assert_eq!(rows.iter().map(TrendRow::total).sum::<u64>(), 1);
    }

    #[test]
    fn test_densify_generic_over_sentiment() {
        let records = vec![
            CallRecord {
                call_date: date(2024, 2, 1).and_hms_opt(8, 0, 0),
                carrier_sentiment: Some("carrier_sentiment_neutral".into()),
                ..Default::default()
            },
            CallRecord {
                call_date: date(2024, 2, 2).and_hms_opt(8, 0, 0),
                carrier_sentiment: Some("carrier_sentiment_positive".into()),
                ..Default::default()
            },
        ];
        let rows = densify_and_count(&records, |r| r.sentiment());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].count(CarrierSentiment::Neutral), 1);
        assert_eq!(rows[1].count(CarrierSentiment::Positive), 1);
        assert_eq!(rows[1].counts.len(), 3);
    }

    #[test]
    fn test_trend_row_serializes_flat() {
        let mut row = TrendRow::<CallOutcome>::zeroed(date(2024, 1, 1));
        row.counts.insert(CallOutcome::RateTooLow, 3);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["date"], "2024-01-01");
        assert_eq!(json["rate_too_low"], 3);
        assert_eq!(json["success_rate_booked"], 0);
    }

    #[test]
    fn test_daily_price_increase_is_sparse() {
        let records = vec![
            priced(date(2024, 1, 1), 1000.0, 1100.0),
            priced(date(2024, 1, 1), 1000.0, 1300.0),
            priced(date(2024, 1, 4), 500.0, 500.0),
        ];
        let points = daily_price_increase(&records);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date(2024, 1, 1));
        assert!((points[0].price_increase - 20.0).abs() < 1e-9);
        assert_eq!(points[1].date, date(2024, 1, 4));
        assert_eq!(points[1].price_increase, 0.0);
    }

    #[test]
    fn test_daily_price_increase_skips_zero_base() {
        let records = vec![
            priced(date(2024, 1, 1), 0.0, 1100.0),
            priced(date(2024, 1, 1), 1000.0, 1050.0),
            priced(date(2024, 1, 2), 0.0, 700.0),
        ];
        let points = daily_price_increase(&records);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, date(2024, 1, 1));
        assert!((points[0].price_increase - 5.0).abs() < 1e-9);
        assert!(points.iter().all(|p| p.price_increase.is_finite()));
    }

    #[test]
    fn test_daily_price_increase_skips_undated_and_unpriced() {
        let mut missing_final = priced(date(2024, 1, 2), 1000.0, 0.0);
        missing_final.final_price = None;
        let mut undated = priced(date(2024, 1, 1), 1000.0, 5000.0);
        undated.call_date = None;

        let records = vec![
            priced(date(2024, 1, 1), 1000.0, 1100.0),
            undated,
            priced(date(2024, 1, 2), 1000.0, 1020.0),
            missing_final,
        ];
        let points = daily_price_increase(&records);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date(2024, 1, 1));
        assert!((points[0].price_increase - 10.0).abs() < 1e-9);
        assert_eq!(points[1].date, date(2024, 1, 2));
        assert!((points[1].price_increase - 2.0).abs() < 1e-9);
    }
}
