//! Prometheus metrics definitions for the sales funnel
//!
//! All metrics use the `funnel_` prefix.

use crate::domain::metrics::{FunnelTotals, StatusBreakdown};
use prometheus::{
    CounterVec, Gauge, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Captures in the last reported scope
    pub captures_count: GenericGauge<AtomicF64>,
    /// Captures with status Client in the last reported scope
    pub clients_count: GenericGauge<AtomicF64>,
    /// Clients / captures (0-1)
    pub conversion_rate: GenericGauge<AtomicF64>,
    /// Sum of expected amounts
    pub expected_amount: GenericGauge<AtomicF64>,
    /// Sum of realized amounts over clients
    pub realized_amount: GenericGauge<AtomicF64>,
    /// Probability-weighted open pipeline
    pub weighted_pipeline: GenericGauge<AtomicF64>,
    /// Successful writes by table and action
    pub writes_total: CounterVec,
    /// Requests refused by the access policy, by resource and action
    pub access_denied_total: CounterVec,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let captures_count = Gauge::with_opts(Opts::new(
            "funnel_captures_count",
            "Captures in the reported scope",
        ))?;
        registry.register(Box::new(captures_count.clone()))?;

        let clients_count = Gauge::with_opts(Opts::new(
            "funnel_clients_count",
            "Captures that reached Client in the reported scope",
        ))?;
        registry.register(Box::new(clients_count.clone()))?;

        let conversion_rate = Gauge::with_opts(Opts::new(
            "funnel_conversion_rate",
            "Clients over captures (0-1)",
        ))?;
        registry.register(Box::new(conversion_rate.clone()))?;

        let expected_amount = Gauge::with_opts(Opts::new(
            "funnel_expected_amount",
            "Sum of expected amounts",
        ))?;
        registry.register(Box::new(expected_amount.clone()))?;

        let realized_amount = Gauge::with_opts(Opts::new(
            "funnel_realized_amount",
            "Sum of realized amounts over clients",
        ))?;
        registry.register(Box::new(realized_amount.clone()))?;

        let weighted_pipeline = Gauge::with_opts(Opts::new(
            "funnel_weighted_pipeline",
            "Probability-weighted expected amount of open captures",
        ))?;
        registry.register(Box::new(weighted_pipeline.clone()))?;

        let writes_total = CounterVec::new(
            Opts::new("funnel_writes_total", "Successful writes by table and action"),
            &["table", "action"],
        )?;
        registry.register(Box::new(writes_total.clone()))?;

        let access_denied_total = CounterVec::new(
            Opts::new(
                "funnel_access_denied_total",
                "Requests refused by the access policy",
            ),
            &["resource", "action"],
        )?;
        registry.register(Box::new(access_denied_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            captures_count,
            clients_count,
            conversion_rate,
            expected_amount,
            realized_amount,
            weighted_pipeline,
            writes_total,
            access_denied_total,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    /// Publish the headline figures of a scope
    pub fn record_snapshot(
        &self,
        breakdown: &StatusBreakdown,
        totals: &FunnelTotals,
        weighted_pipeline: Decimal,
    ) {
        self.captures_count.set(breakdown.total as f64);
        self.clients_count.set(breakdown.client as f64);
        self.conversion_rate.set(breakdown.conversion_rate());
        self.expected_amount
            .set(totals.expected.to_f64().unwrap_or(0.0));
        self.realized_amount
            .set(totals.realized.to_f64().unwrap_or(0.0));
        self.weighted_pipeline
            .set(weighted_pipeline.to_f64().unwrap_or(0.0));
    }

    pub fn inc_writes(&self, table: &str, action: &str) {
        self.writes_total.with_label_values(&[table, action]).inc();
    }

    pub fn inc_access_denied(&self, resource: &str, action: &str) {
        self.access_denied_total
            .with_label_values(&[resource, action])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        assert!(metrics.render().contains("funnel_conversion_rate"));
    }

    #[test]
    fn test_snapshot_update() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        let breakdown = StatusBreakdown {
            total: 4,
            prospect: 1,
            proposal: 1,
            documentation: 1,
            client: 1,
        };
        let totals = FunnelTotals {
            expected: dec!(1500),
            realized: dec!(420.5),
        };
        metrics.record_snapshot(&breakdown, &totals, dec!(300));

        let output = metrics.render();
        assert!(output.contains("funnel_captures_count 4"));
        assert!(output.contains("funnel_conversion_rate 0.25"));
        assert!(output.contains("funnel_realized_amount 420.5"));
    }

    #[test]
    fn test_access_denied_counter() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.inc_access_denied("monthly_goal", "insert");
        metrics.inc_access_denied("monthly_goal", "insert");
        let output = metrics.render();
        assert!(output.contains(
            "funnel_access_denied_total{action=\"insert\",resource=\"monthly_goal\"} 2"
        ));
    }
}
