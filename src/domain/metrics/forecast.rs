//! Forward-looking revenue figures derived from product reference data.

use crate::domain::funnel::types::add_months;
use crate::domain::funnel::{CaptureRecord, Probability, ProductConfig};
use crate::domain::metrics::conversion::realized_value;
use crate::domain::metrics::semaphore::{SemaphoreLight, SemaphoreThresholds};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Lookup of product reference data by name.
pub struct ProductCatalogue<'a> {
    by_name: HashMap<&'a str, &'a ProductConfig>,
}

impl<'a> ProductCatalogue<'a> {
    pub fn new(products: &'a [ProductConfig]) -> Self {
        Self {
            by_name: products.iter().map(|p| (p.name.as_str(), p)).collect(),
        }
    }

    /// Adjusted probability when set, else the product default, else zero.
    pub fn probability_for(&self, record: &CaptureRecord) -> Probability {
        record
            .probability_adjusted
            .or_else(|| self.by_name.get(record.product.as_str()).map(|p| p.default_probability))
            .unwrap_or(Probability::ZERO)
    }

    /// First-of-month when the capture's revenue is recognized.
    pub fn recognition_month(&self, record: &CaptureRecord) -> NaiveDate {
        let lag = self
            .by_name
            .get(record.product.as_str())
            .map(|p| p.recognition_lag_months)
            .unwrap_or(0);
        add_months(record.expected_close_month, lag)
    }

    /// Probability-weighted expected amount of an open capture; zero once closed.
    pub fn weighted_amount(&self, record: &CaptureRecord) -> Decimal {
        if record.status.is_closed() {
            return Decimal::ZERO;
        }
        let probability =
            Decimal::from_f64(self.probability_for(record).value()).unwrap_or(Decimal::ZERO);
        (record.expected_amount * probability).round_dp(2)
    }
}

/// Sum of probability-weighted expected amounts over open captures.
pub fn weighted_pipeline(records: &[CaptureRecord], products: &[ProductConfig]) -> Decimal {
    let catalogue = ProductCatalogue::new(products);
    records.iter().map(|r| catalogue.weighted_amount(r)).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionBucket {
    pub month: NaiveDate,
    /// Revenue already won, recognized this month
    pub realized: Decimal,
    /// Probability-weighted revenue still in the funnel
    pub weighted: Decimal,
}

/// Realized and weighted revenue by recognition month (close month + product lag).
pub fn recognition_schedule(
    records: &[CaptureRecord],
    products: &[ProductConfig],
) -> Vec<RecognitionBucket> {
    let catalogue = ProductCatalogue::new(products);
    let mut months: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    for record in records {
        let entry = months.entry(catalogue.recognition_month(record)).or_default();
        entry.0 += realized_value(record);
        entry.1 += catalogue.weighted_amount(record);
    }
    months
        .into_iter()
        .map(|(month, (realized, weighted))| RecognitionBucket {
            month,
            realized,
            weighted,
        })
        .collect()
}

/// Realized revenue measured against a monthly goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal: Decimal,
    pub realized: Decimal,
    /// realized / goal; 0 when the goal is 0
    pub attainment: f64,
    pub light: SemaphoreLight,
}

impl GoalProgress {
    pub fn new(goal: Decimal, realized: Decimal, thresholds: &SemaphoreThresholds) -> Self {
        let attainment = if goal.is_zero() {
            0.0
        } else {
            (realized / goal).to_f64().unwrap_or(0.0)
        };
        Self {
            goal,
            realized,
            attainment,
            light: thresholds.classify(attainment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::funnel::FunnelStatus;
    use crate::domain::metrics::test_support::{capture, date};
    use rust_decimal_macros::dec;

    fn products() -> Vec<ProductConfig> {
        vec![
            ProductConfig::new("Leasing", 2, 0.4).unwrap(),
            ProductConfig::new("FX", 0, 0.9).unwrap(),
        ]
    }

    #[test]
    fn test_weighted_pipeline_uses_adjusted_then_default() {
        let mut leasing = capture("ana", "A", FunnelStatus::Proposal, dec!(1000), None);
        leasing.product = "Leasing".to_string();
        let mut fx = capture("ana", "B", FunnelStatus::Prospect, dec!(200), None);
        fx.product = "FX".to_string();
        fx.probability_adjusted = Some(Probability::new("p", 0.25).unwrap());
        let mut unknown = capture("ana", "C", FunnelStatus::Prospect, dec!(500), None);
        unknown.product = "Discontinued".to_string();
        let mut won = capture("ana", "D", FunnelStatus::Client, dec!(700), Some(dec!(650)));
        won.product = "FX".to_string();

        let pipeline = weighted_pipeline(&[leasing, fx, unknown, won], &products());
        // 1000 * 0.4 + 200 * 0.25 + 500 * 0 + closed deal excluded
        assert_eq!(pipeline, dec!(450));
    }

    #[test]
    fn test_recognition_schedule_applies_lag() {
        let mut leasing = capture("ana", "A", FunnelStatus::Proposal, dec!(1000), None);
        leasing.product = "Leasing".to_string();
        leasing.expected_close_month = date(2025, 11, 1);
        let mut fx = capture("ana", "B", FunnelStatus::Client, dec!(300), Some(dec!(320)));
        fx.product = "FX".to_string();
        fx.expected_close_month = date(2026, 1, 1);

        let schedule = recognition_schedule(&[leasing, fx], &products());
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].month, date(2026, 1, 1));
        assert_eq!(schedule[0].realized, dec!(320));
        assert_eq!(schedule[0].weighted, dec!(400));
    }

    #[test]
    fn test_goal_progress() {
        let thresholds = SemaphoreThresholds::new(0.5, 0.9);
        let progress = GoalProgress::new(dec!(10000), dec!(7500), &thresholds);
        assert_eq!(progress.attainment, 0.75);
        assert_eq!(progress.light, SemaphoreLight::Yellow);

        let progress = GoalProgress::new(Decimal::ZERO, dec!(100), &thresholds);
        assert_eq!(progress.attainment, 0.0);
        assert_eq!(progress.light, SemaphoreLight::Red);
    }
}
