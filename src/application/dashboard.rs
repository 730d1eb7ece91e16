//! Per-month funnel report assembled from the captures a requester can see.

use crate::domain::funnel::{CaptureRecord, DateWindow, ProductConfig};
use crate::domain::metrics::{
    AdvisorSummary, FunnelTotals, GoalProgress, RecognitionBucket, SemaphoreLight,
    SemaphoreThresholds, SeriesPoint, StatusBreakdown, advisor_summaries, daily_series,
    monthly_series, prospect_only_clients, recognition_schedule, weighted_pipeline,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
pub struct DashboardOptions {
    pub window: DateWindow,
    pub thresholds: SemaphoreThresholds,
    pub cumulative: bool,
    /// Include the per-advisor breakdown
    pub admin_view: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub window: DateWindow,
    pub breakdown: StatusBreakdown,
    pub totals: FunnelTotals,
    pub conversion_rate: f64,
    pub light: SemaphoreLight,
    pub daily: Vec<SeriesPoint>,
    pub by_close_month: Vec<SeriesPoint>,
    pub prospect_only: Vec<String>,
    pub weighted_pipeline: Decimal,
    pub recognition: Vec<RecognitionBucket>,
    pub goal: Option<GoalProgress>,
    pub advisors: Vec<AdvisorSummary>,
}

impl Dashboard {
    /// `records` must already be scoped to the requester and the window.
    pub fn build(
        records: &[CaptureRecord],
        products: &[ProductConfig],
        goal: Option<Decimal>,
        options: &DashboardOptions,
    ) -> Self {
        let breakdown = StatusBreakdown::from_records(records);
        let totals = FunnelTotals::from_records(records);
        let conversion_rate = breakdown.conversion_rate();

        Self {
            window: options.window,
            breakdown,
            totals,
            conversion_rate,
            light: options.thresholds.classify(conversion_rate),
            daily: daily_series(records, options.window, options.cumulative),
            by_close_month: monthly_series(records, options.cumulative),
            prospect_only: prospect_only_clients(records),
            weighted_pipeline: weighted_pipeline(records, products),
            recognition: recognition_schedule(records, products),
            goal: goal.map(|amount| GoalProgress::new(amount, totals.realized, &options.thresholds)),
            advisors: if options.admin_view {
                advisor_summaries(records, &options.thresholds)
            } else {
                Vec::new()
            },
        }
    }

    /// Plain-text rendering for the terminal.
    pub fn render_text(&self, title: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{} | {} .. {}\n",
            title, self.window.from, self.window.to_exclusive
        ));
        out.push_str(&format!(
            "Captures: {} (Prospect {}, Proposal {}, Documentation {}, Client {})\n",
            self.breakdown.total,
            self.breakdown.prospect,
            self.breakdown.proposal,
            self.breakdown.documentation,
            self.breakdown.client
        ));
        out.push_str(&format!(
            "Conversion: {:.1}% [{}]\n",
            self.conversion_rate * 100.0,
            self.light
        ));
        out.push_str(&format!(
            "Expected: {} | Realized: {} | Weighted pipeline: {}\n",
            self.totals.expected, self.totals.realized, self.weighted_pipeline
        ));
        if let Some(goal) = &self.goal {
            out.push_str(&format!(
                "Goal: {} | Attainment: {:.1}% [{}]\n",
                goal.goal,
                goal.attainment * 100.0,
                goal.light
            ));
        }
        if !self.prospect_only.is_empty() {
            out.push_str(&format!("Prospect only: {}\n", self.prospect_only.join(", ")));
        }
        for summary in &self.advisors {
            out.push_str(&format!(
                "  {:<20} {:>4} captures {:>6.1}% [{}] realized {}\n",
                summary.advisor,
                summary.breakdown.total,
                summary.conversion_rate * 100.0,
                summary.light,
                summary.totals.realized
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::funnel::{ClientCategory, FunnelStatus};
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(
        advisor: &str,
        client: &str,
        day: u32,
        status: FunnelStatus,
        expected: Decimal,
        realized: Option<Decimal>,
    ) -> CaptureRecord {
        CaptureRecord {
            id: Uuid::new_v4(),
            created_at: Utc.with_ymd_and_hms(2025, 6, day, 9, 0, 0).unwrap(),
            user_id: Uuid::new_v4(),
            advisor: advisor.to_string(),
            client: client.to_string(),
            reference: None,
            product: "Leasing".to_string(),
            expected_amount: expected,
            realized_amount: realized,
            capture_date: date(2025, 6, day),
            expected_close_month: date(2025, 7, 1),
            visit_date: None,
            category: ClientCategory::New,
            status,
            probability_adjusted: None,
        }
    }

    fn options(admin_view: bool) -> DashboardOptions {
        DashboardOptions {
            window: DateWindow::month(date(2025, 6, 1)),
            thresholds: SemaphoreThresholds::new(0.2, 0.5),
            cumulative: true,
            admin_view,
        }
    }

    #[test]
    fn test_build_month_report() {
        let records = vec![
            record("ana", "Bakery", 2, FunnelStatus::Client, dec!(100), Some(dec!(120))),
            record("ana", "Garage", 5, FunnelStatus::Proposal, dec!(50), None),
            record("luis", "Florist", 5, FunnelStatus::Prospect, dec!(200), None),
        ];
        let products = vec![ProductConfig::new("Leasing", 1, 0.5).unwrap()];

        let dashboard = Dashboard::build(&records, &products, Some(dec!(400)), &options(true));

        assert_eq!(dashboard.breakdown.total, 3);
        assert_eq!(dashboard.totals.expected, dec!(350));
        assert_eq!(dashboard.totals.realized, dec!(120));
        assert_eq!(dashboard.light, SemaphoreLight::Yellow);
        assert_eq!(dashboard.daily.len(), 30);
        assert_eq!(dashboard.daily.last().unwrap().estimated, dec!(350));
        assert_eq!(dashboard.prospect_only, vec!["Florist".to_string()]);
        assert_eq!(dashboard.weighted_pipeline, dec!(125));
        assert_eq!(dashboard.recognition[0].month, date(2025, 8, 1));

        let goal = dashboard.goal.unwrap();
        assert!((goal.attainment - 0.3).abs() < 1e-9);
        assert_eq!(goal.light, SemaphoreLight::Yellow);

        let advisors: Vec<&str> = dashboard.advisors.iter().map(|a| a.advisor.as_str()).collect();
        assert_eq!(advisors, vec!["ana", "luis"]);
    }

    #[test]
    fn test_advisor_view_and_empty_scope() {
        let dashboard = Dashboard::build(&[], &[], None, &options(false));
        assert_eq!(dashboard.conversion_rate, 0.0);
        assert_eq!(dashboard.light, SemaphoreLight::Red);
        assert!(dashboard.goal.is_none());
        assert!(dashboard.advisors.is_empty());
        assert!(dashboard.daily.iter().all(|p| p.estimated.is_zero()));

        let text = dashboard.render_text("Sales Funnel");
        assert!(text.contains("Captures: 0"));
        assert!(!text.contains("Goal:"));
    }

    #[test]
    fn test_dashboard_serializes_to_json() {
        let records = vec![record("ana", "Bakery", 2, FunnelStatus::Client, dec!(100), Some(dec!(100)))];
        let dashboard = Dashboard::build(&records, &[], None, &options(false));
        let json = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(json["light"], "green");
        assert_eq!(json["breakdown"]["client"], 1);
    }
}
