use crate::domain::errors::ValidationError;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stage of a capture in the sales funnel.
///
/// Stages are ordered: a lead starts as a `Prospect` and moves forward until it
/// becomes a `Client`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FunnelStatus {
    Prospect,
    Proposal,
    Documentation,
    Client,
}

impl FunnelStatus {
    pub const ALL: [FunnelStatus; 4] = [
        FunnelStatus::Prospect,
        FunnelStatus::Proposal,
        FunnelStatus::Documentation,
        FunnelStatus::Client,
    ];

    /// Position in the funnel, starting at 1 for `Prospect`.
    pub fn rank(self) -> u8 {
        match self {
            FunnelStatus::Prospect => 1,
            FunnelStatus::Proposal => 2,
            FunnelStatus::Documentation => 3,
            FunnelStatus::Client => 4,
        }
    }

    /// Allowed-transition table: staying put or moving to any later stage.
    pub fn can_transition_to(self, next: FunnelStatus) -> bool {
        next.rank() >= self.rank()
    }

    pub fn is_closed(self) -> bool {
        self == FunnelStatus::Client
    }
}

impl fmt::Display for FunnelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunnelStatus::Prospect => write!(f, "Prospect"),
            FunnelStatus::Proposal => write!(f, "Proposal"),
            FunnelStatus::Documentation => write!(f, "Documentation"),
            FunnelStatus::Client => write!(f, "Client"),
        }
    }
}

impl FromStr for FunnelStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prospect" => Ok(FunnelStatus::Prospect),
            "proposal" => Ok(FunnelStatus::Proposal),
            "documentation" => Ok(FunnelStatus::Documentation),
            "client" => Ok(FunnelStatus::Client),
            _ => Err(ValidationError::UnknownStatus(s.to_string())),
        }
    }
}

/// Whether the capture is a new client or an existing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientCategory {
    New,
    /// Business as usual
    Bau,
}

impl fmt::Display for ClientCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientCategory::New => write!(f, "New"),
            ClientCategory::Bau => write!(f, "BAU"),
        }
    }
}

impl FromStr for ClientCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(ClientCategory::New),
            "bau" => Ok(ClientCategory::Bau),
            _ => Err(ValidationError::UnknownCategory(s.to_string())),
        }
    }
}

/// A probability in the closed range [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Probability(f64);

impl Probability {
    pub const ZERO: Probability = Probability(0.0);
    pub const HALF: Probability = Probability(0.5);

    pub fn new(field: &str, value: f64) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::ProbabilityOutOfRange {
                field: field.to_string(),
                value,
            });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Probability {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Probability::new("probability", value)
    }
}

impl From<Probability> for f64 {
    fn from(p: Probability) -> Self {
        p.0
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month `months` after the month containing `date`.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let start = first_of_month(date);
    start.checked_add_months(Months::new(months)).unwrap_or(start)
}

/// Half-open `[from, to)` date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to_exclusive: NaiveDate,
}

impl DateWindow {
    /// The calendar month containing `date`.
    pub fn month(date: NaiveDate) -> Self {
        let from = first_of_month(date);
        Self {
            from,
            to_exclusive: add_months(from, 1),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date < self.to_exclusive
    }

    /// Every day in the window, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.from
            .iter_days()
            .take_while(move |d| *d < self.to_exclusive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_parse_and_display() {
        for status in FunnelStatus::ALL {
            let parsed: FunnelStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert_eq!("  CLIENT ".parse::<FunnelStatus>().unwrap(), FunnelStatus::Client);
        assert!(matches!(
            "Cancelled".parse::<FunnelStatus>(),
            Err(ValidationError::UnknownStatus(_))
        ));
    }

    #[test]
    fn test_transitions_are_forward_only() {
        assert!(FunnelStatus::Prospect.can_transition_to(FunnelStatus::Proposal));
        assert!(FunnelStatus::Prospect.can_transition_to(FunnelStatus::Client));
        assert!(FunnelStatus::Documentation.can_transition_to(FunnelStatus::Documentation));
        assert!(!FunnelStatus::Client.can_transition_to(FunnelStatus::Proposal));
        assert!(!FunnelStatus::Documentation.can_transition_to(FunnelStatus::Prospect));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("bau".parse::<ClientCategory>().unwrap(), ClientCategory::Bau);
        assert_eq!(ClientCategory::Bau.to_string(), "BAU");
        assert!("Portfolio visit".parse::<ClientCategory>().is_err());
    }

    #[test]
    fn test_probability_bounds() {
        assert!(Probability::new("p", 0.0).is_ok());
        assert!(Probability::new("p", 1.0).is_ok());
        assert_eq!(
            Probability::new("p", 1.2),
            Err(ValidationError::ProbabilityOutOfRange {
                field: "p".to_string(),
                value: 1.2
            })
        );
        assert!(Probability::new("p", -0.01).is_err());
        assert!(Probability::new("p", f64::NAN).is_err());
    }

    #[test]
    fn test_probability_deserialize_rejects_out_of_range() {
        let ok: Probability = serde_json::from_str("0.4").unwrap();
        assert_eq!(ok.value(), 0.4);
        assert!(serde_json::from_str::<Probability>("2.0").is_err());
    }

    #[test]
    fn test_month_helpers() {
        assert_eq!(first_of_month(date(2025, 3, 17)), date(2025, 3, 1));
        assert_eq!(add_months(date(2025, 12, 31), 1), date(2026, 1, 1));
        assert_eq!(add_months(date(2025, 1, 31), 0), date(2025, 1, 1));

        let window = DateWindow::month(date(2024, 2, 10));
        assert_eq!(window.days().count(), 29);
        assert!(window.contains(date(2024, 2, 29)));
        assert!(!window.contains(date(2024, 3, 1)));
    }
}
