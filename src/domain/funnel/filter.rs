use crate::domain::funnel::types::{ClientCategory, DateWindow, FunnelStatus};
use chrono::NaiveDate;

pub const DEFAULT_CAPTURE_LIMIT: usize = 5000;

/// Optional narrowing of a capture listing. The access scope is applied
/// separately and cannot be widened through a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFilter {
    /// Inclusive lower bound on `capture_date`
    pub date_from: Option<NaiveDate>,
    /// Exclusive upper bound on `capture_date`
    pub date_to_exclusive: Option<NaiveDate>,
    pub category: Option<ClientCategory>,
    pub advisor: Option<String>,
    pub status: Option<FunnelStatus>,
    pub limit: usize,
}

impl Default for CaptureFilter {
    fn default() -> Self {
        Self {
            date_from: None,
            date_to_exclusive: None,
            category: None,
            advisor: None,
            status: None,
            limit: DEFAULT_CAPTURE_LIMIT,
        }
    }
}

impl CaptureFilter {
    pub fn window(window: DateWindow) -> Self {
        Self {
            date_from: Some(window.from),
            date_to_exclusive: Some(window.to_exclusive),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: Option<ClientCategory>) -> Self {
        self.category = category;
        self
    }

    pub fn with_advisor(mut self, advisor: Option<String>) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn with_status(mut self, status: Option<FunnelStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}
