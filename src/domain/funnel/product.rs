use crate::domain::errors::ValidationError;
use crate::domain::funnel::types::Probability;
use serde::{Deserialize, Serialize};

/// Default catalogue seeded on first start.
pub const DEFAULT_PRODUCTS: [&str; 7] = [
    "FX",
    "Investments",
    "Factoring",
    "Leasing",
    "POS Terminals",
    "POS Credit",
    "Credit",
];

/// Per-product reference data used by the forecast metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    pub name: String,
    /// Months between the expected closing month and revenue recognition
    pub recognition_lag_months: u32,
    /// Conservative probability applied when a capture has no adjusted one
    pub default_probability: Probability,
    pub active: bool,
}

impl ProductConfig {
    pub fn new(
        name: impl Into<String>,
        recognition_lag_months: u32,
        default_probability: f64,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "product".to_string(),
            });
        }
        Ok(Self {
            name,
            recognition_lag_months,
            default_probability: Probability::new("default_probability", default_probability)?,
            active: true,
        })
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn default_catalogue() -> Vec<ProductConfig> {
        DEFAULT_PRODUCTS
            .iter()
            .map(|name| ProductConfig {
                name: (*name).to_string(),
                recognition_lag_months: 0,
                default_probability: Probability::HALF,
                active: true,
            })
            .collect()
    }
}
