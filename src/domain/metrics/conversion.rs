use crate::domain::funnel::{CaptureRecord, FunnelStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Count of captures per funnel stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub total: usize,
    pub prospect: usize,
    pub proposal: usize,
    pub documentation: usize,
    pub client: usize,
}

impl StatusBreakdown {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CaptureRecord>) -> Self {
        let mut breakdown = Self::default();
        for record in records {
            breakdown.total += 1;
            match record.status {
                FunnelStatus::Prospect => breakdown.prospect += 1,
                FunnelStatus::Proposal => breakdown.proposal += 1,
                FunnelStatus::Documentation => breakdown.documentation += 1,
                FunnelStatus::Client => breakdown.client += 1,
            }
        }
        breakdown
    }

    pub fn count(&self, status: FunnelStatus) -> usize {
        match status {
            FunnelStatus::Prospect => self.prospect,
            FunnelStatus::Proposal => self.proposal,
            FunnelStatus::Documentation => self.documentation,
            FunnelStatus::Client => self.client,
        }
    }

    /// Clients over all captures. An empty scope has a rate of 0.
    pub fn conversion_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.client as f64 / self.total as f64
    }
}

/// Conversion rate of a set of captures: clients / all. Returns 0.0 when empty.
pub fn conversion_rate(records: &[CaptureRecord]) -> f64 {
    StatusBreakdown::from_records(records).conversion_rate()
}

/// Estimated and realized revenue sums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelTotals {
    /// Sum of expected amounts over every capture
    pub expected: Decimal,
    /// Sum of realized amounts over captures that reached `Client`
    pub realized: Decimal,
}

impl FunnelTotals {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CaptureRecord>) -> Self {
        records.into_iter().fold(Self::default(), |mut acc, record| {
            acc.expected += record.expected_amount;
            acc.realized += realized_value(record);
            acc
        })
    }
}

/// Realized revenue a capture contributes: its realized amount once closed, else zero.
pub(crate) fn realized_value(record: &CaptureRecord) -> Decimal {
    if record.status.is_closed() {
        record.realized_amount.unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::test_support::capture;
    use rust_decimal_macros::dec;

    #[test]
    fn test_conversion_and_totals_example() {
        let records = vec![
            capture("ana", "Bakery", FunnelStatus::Client, dec!(100), Some(dec!(120))),
            capture("ana", "Garage", FunnelStatus::Proposal, dec!(50), None),
        ];

        assert_eq!(conversion_rate(&records), 0.5);

        let totals = FunnelTotals::from_records(&records);
        assert_eq!(totals.expected, dec!(150));
        assert_eq!(totals.realized, dec!(120));
    }

    #[test]
    fn test_empty_scope_is_zero() {
        let empty: Vec<CaptureRecord> = Vec::new();
        assert_eq!(conversion_rate(&empty), 0.0);
        let totals = FunnelTotals::from_records(&empty);
        assert_eq!(totals, FunnelTotals::default());
    }

    #[test]
    fn test_realized_ignored_before_client() {
        // A realized figure typed in early does not count until the deal closes
        let records = vec![capture(
            "ana",
            "Garage",
            FunnelStatus::Documentation,
            dec!(80),
            Some(dec!(75)),
        )];
        assert_eq!(FunnelTotals::from_records(&records).realized, Decimal::ZERO);
    }

    #[test]
    fn test_breakdown_counts() {
        let records = vec![
            capture("ana", "A", FunnelStatus::Prospect, dec!(1), None),
            capture("ana", "B", FunnelStatus::Prospect, dec!(1), None),
            capture("ana", "C", FunnelStatus::Documentation, dec!(1), None),
            capture("ana", "D", FunnelStatus::Client, dec!(1), Some(dec!(1))),
        ];
        let breakdown = StatusBreakdown::from_records(&records);
        assert_eq!(breakdown.total, 4);
        assert_eq!(breakdown.count(FunnelStatus::Prospect), 2);
        assert_eq!(breakdown.count(FunnelStatus::Proposal), 0);
        assert_eq!(breakdown.count(FunnelStatus::Documentation), 1);
        assert_eq!(breakdown.conversion_rate(), 0.25);
    }
}
