use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{BudgetMonth, SavingsGoal};

use super::expense::{validate_amount, ExpenseValidationError};

pub fn validate_goal(goal: SavingsGoal) -> Result<SavingsGoal, ExpenseValidationError> {
    Ok(SavingsGoal {
        amount: validate_amount(goal.amount)?,
        month: goal.month,
    })
}

/// Goal for the month containing `today`
pub fn goal_for_current_month(amount: Decimal, today: NaiveDate) -> Result<SavingsGoal, ExpenseValidationError> {
    validate_goal(SavingsGoal {
        amount,
        month: BudgetMonth::from_date(today),
    })
}

pub fn parse_goal_month(raw: &str) -> Result<BudgetMonth, ExpenseValidationError> {
    raw.parse::<BudgetMonth>()
        .map_err(|e| ExpenseValidationError::InvalidMonth(e.to_string()))
}

/// A stored goal only counts when it belongs to the month containing `today`
pub fn active_goal(goal: Option<&SavingsGoal>, today: NaiveDate) -> Option<&SavingsGoal> {
    goal.filter(|g| g.month.contains(today))
}
