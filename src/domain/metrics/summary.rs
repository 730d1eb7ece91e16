use crate::domain::funnel::{CaptureRecord, FunnelStatus};
use crate::domain::metrics::conversion::{FunnelTotals, StatusBreakdown};
use crate::domain::metrics::semaphore::{SemaphoreLight, SemaphoreThresholds};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Per-advisor row of the admin overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorSummary {
    pub advisor: String,
    pub breakdown: StatusBreakdown,
    pub totals: FunnelTotals,
    pub conversion_rate: f64,
    pub light: SemaphoreLight,
}

/// One summary per advisor alias, sorted by alias.
pub fn advisor_summaries(
    records: &[CaptureRecord],
    thresholds: &SemaphoreThresholds,
) -> Vec<AdvisorSummary> {
    let mut by_advisor: BTreeMap<&str, Vec<&CaptureRecord>> = BTreeMap::new();
    for record in records {
        by_advisor.entry(record.advisor.as_str()).or_default().push(record);
    }

    by_advisor
        .into_iter()
        .map(|(advisor, chunk)| {
            let breakdown = StatusBreakdown::from_records(chunk.iter().copied());
            let conversion_rate = breakdown.conversion_rate();
            AdvisorSummary {
                advisor: advisor.to_string(),
                breakdown,
                totals: FunnelTotals::from_records(chunk.iter().copied()),
                conversion_rate,
                light: thresholds.classify(conversion_rate),
            }
        })
        .collect()
}

/// Clients that never got past the first contact: their furthest status
/// across all captures in scope is `Prospect`. Sorted, without duplicates.
pub fn prospect_only_clients(records: &[CaptureRecord]) -> Vec<String> {
    let mut furthest: HashMap<&str, FunnelStatus> = HashMap::new();
    for record in records {
        furthest
            .entry(record.client.as_str())
            .and_modify(|s| *s = (*s).max(record.status))
            .or_insert(record.status);
    }

    furthest
        .into_iter()
        .filter(|(_, status)| *status == FunnelStatus::Prospect)
        .map(|(client, _)| client.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::test_support::capture;
    use rust_decimal_macros::dec;

    #[test]
    fn test_advisor_summaries_sorted_with_lights() {
        let records = vec![
            capture("zoe", "A", FunnelStatus::Client, dec!(100), Some(dec!(100))),
            capture("zoe", "B", FunnelStatus::Client, dec!(50), Some(dec!(60))),
            capture("ana", "C", FunnelStatus::Prospect, dec!(30), None),
            capture("ana", "D", FunnelStatus::Proposal, dec!(20), None),
            capture("ana", "E", FunnelStatus::Proposal, dec!(20), None),
            capture("ana", "F", FunnelStatus::Client, dec!(10), Some(dec!(10))),
        ];
        let summaries = advisor_summaries(&records, &SemaphoreThresholds::new(0.2, 0.5));

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].advisor, "ana");
        assert_eq!(summaries[0].breakdown.total, 4);
        assert_eq!(summaries[0].conversion_rate, 0.25);
        assert_eq!(summaries[0].light, SemaphoreLight::Yellow);
        assert_eq!(summaries[0].totals.expected, dec!(80));

        assert_eq!(summaries[1].advisor, "zoe");
        assert_eq!(summaries[1].conversion_rate, 1.0);
        assert_eq!(summaries[1].light, SemaphoreLight::Green);
        assert_eq!(summaries[1].totals.realized, dec!(160));
    }

    #[test]
    fn test_prospect_only_clients() {
        let records = vec![
            capture("ana", "Tacos Rio", FunnelStatus::Prospect, dec!(1), None),
            capture("ana", "Tacos Rio", FunnelStatus::Prospect, dec!(1), None),
            capture("ana", "Bakery", FunnelStatus::Prospect, dec!(1), None),
            capture("ana", "Bakery", FunnelStatus::Proposal, dec!(1), None),
            capture("ana", "Auto Sur", FunnelStatus::Prospect, dec!(1), None),
        ];
        assert_eq!(
            prospect_only_clients(&records),
            vec!["Auto Sur".to_string(), "Tacos Rio".to_string()]
        );
        assert!(prospect_only_clients(&[]).is_empty());
    }
}
