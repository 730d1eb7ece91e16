use crate::domain::errors::ValidationError;
use crate::domain::funnel::capture::require_non_negative;
use crate::domain::funnel::types::first_of_month;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Revenue target for one advisor in one month. Unique per (advisor, month).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyGoal {
    pub id: Uuid,
    pub advisor_id: Uuid,
    pub month: NaiveDate,
    pub amount: Decimal,
}

impl MonthlyGoal {
    pub fn new(advisor_id: Uuid, month: NaiveDate, amount: Decimal) -> Result<Self, ValidationError> {
        require_non_negative("goal_amount", amount)?;
        Ok(Self {
            id: Uuid::new_v4(),
            advisor_id,
            month: first_of_month(month),
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_goal_month_is_normalized() {
        let goal = MonthlyGoal::new(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2025, 9, 23).unwrap(),
            dec!(50000),
        )
        .unwrap();
        assert_eq!(goal.month, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
    }

    #[test]
    fn test_negative_goal_rejected() {
        let result = MonthlyGoal::new(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            dec!(-1),
        );
        assert!(matches!(result, Err(ValidationError::NegativeAmount { .. })));
    }
}
