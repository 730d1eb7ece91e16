use crate::domain::funnel::{CaptureRecord, DateWindow};
use crate::domain::metrics::conversion::realized_value;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Estimated vs realized revenue for one period (a day or a month start).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub period: NaiveDate,
    pub estimated: Decimal,
    pub realized: Decimal,
}

/// Per-day totals by `capture_date`, one point for every day of `window`.
///
/// Days without captures are present with zero values; captures outside the
/// window are ignored.
pub fn daily_series(records: &[CaptureRecord], window: DateWindow, cumulative: bool) -> Vec<SeriesPoint> {
    let buckets = bucket(
        records.iter().filter(|r| window.contains(r.capture_date)),
        |r| r.capture_date,
    );

    let mut points: Vec<SeriesPoint> = window
        .days()
        .map(|day| {
            let (estimated, realized) = buckets.get(&day).copied().unwrap_or_default();
            SeriesPoint {
                period: day,
                estimated,
                realized,
            }
        })
        .collect();

    if cumulative {
        accumulate(&mut points);
    }
    points
}

/// Totals grouped by expected closing month, ascending. Only months with captures appear.
pub fn monthly_series(records: &[CaptureRecord], cumulative: bool) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = bucket(records.iter(), |r| r.expected_close_month)
        .into_iter()
        .map(|(period, (estimated, realized))| SeriesPoint {
            period,
            estimated,
            realized,
        })
        .collect();

    if cumulative {
        accumulate(&mut points);
    }
    points
}

fn bucket<'a>(
    records: impl Iterator<Item = &'a CaptureRecord>,
    key: impl Fn(&CaptureRecord) -> NaiveDate,
) -> BTreeMap<NaiveDate, (Decimal, Decimal)> {
    let mut buckets: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    for record in records {
        let entry = buckets.entry(key(record)).or_default();
        entry.0 += record.expected_amount;
        entry.1 += realized_value(record);
    }
    buckets
}

/// Turn per-period values into running sums, in place.
fn accumulate(points: &mut [SeriesPoint]) {
    let mut estimated = Decimal::ZERO;
    let mut realized = Decimal::ZERO;
    for point in points.iter_mut() {
        estimated += point.estimated;
        realized += point.realized;
        point.estimated = estimated;
        point.realized = realized;
    }
}
