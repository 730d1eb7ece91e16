use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemaphoreLight {
    Red,
    Yellow,
    Green,
}

impl fmt::Display for SemaphoreLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemaphoreLight::Red => write!(f, "red"),
            SemaphoreLight::Yellow => write!(f, "yellow"),
            SemaphoreLight::Green => write!(f, "green"),
        }
    }
}

/// Two ordered cutoffs classifying a rate into red / yellow / green.
///
/// `red` is kept within [0, 0.9] and `yellow` within [red, 0.95], so the
/// cutoffs can never cross.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SemaphoreThresholds {
    red: f64,
    yellow: f64,
}

impl SemaphoreThresholds {
    pub const DEFAULT_RED: f64 = 0.10;
    pub const DEFAULT_YELLOW: f64 = 0.25;
    const MAX_RED: f64 = 0.9;
    const MAX_YELLOW: f64 = 0.95;

    pub fn new(red: f64, yellow: f64) -> Self {
        let red = if red.is_finite() {
            red.clamp(0.0, Self::MAX_RED)
        } else {
            Self::DEFAULT_RED
        };
        let yellow = if yellow.is_finite() {
            yellow.clamp(red, Self::MAX_YELLOW)
        } else {
            Self::DEFAULT_YELLOW.max(red)
        };
        Self { red, yellow }
    }

    pub fn red(&self) -> f64 {
        self.red
    }

    pub fn yellow(&self) -> f64 {
        self.yellow
    }

    /// rate < red => Red; rate < yellow => Yellow; otherwise Green.
    pub fn classify(&self, rate: f64) -> SemaphoreLight {
        if rate < self.red {
            SemaphoreLight::Red
        } else if rate < self.yellow {
            SemaphoreLight::Yellow
        } else {
            SemaphoreLight::Green
        }
    }
}

impl Default for SemaphoreThresholds {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RED, Self::DEFAULT_YELLOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let thresholds = SemaphoreThresholds::new(0.2, 0.5);
        assert_eq!(thresholds.classify(0.1), SemaphoreLight::Red);
        assert_eq!(thresholds.classify(0.3), SemaphoreLight::Yellow);
        assert_eq!(thresholds.classify(0.6), SemaphoreLight::Green);
    }

    #[test]
    fn test_cutoffs_are_exclusive() {
        let thresholds = SemaphoreThresholds::new(0.2, 0.5);
        assert_eq!(thresholds.classify(0.2), SemaphoreLight::Yellow);
        assert_eq!(thresholds.classify(0.5), SemaphoreLight::Green);
    }

    #[test]
    fn test_thresholds_are_clamped_and_ordered() {
        let thresholds = SemaphoreThresholds::new(1.5, 0.1);
        assert_eq!(thresholds.red(), 0.9);
        assert_eq!(thresholds.yellow(), 0.9);

        let thresholds = SemaphoreThresholds::new(-0.3, 2.0);
        assert_eq!(thresholds.red(), 0.0);
        assert_eq!(thresholds.yellow(), 0.95);

        let thresholds = SemaphoreThresholds::new(f64::NAN, f64::INFINITY);
        assert_eq!(thresholds, SemaphoreThresholds::default());
    }
}
