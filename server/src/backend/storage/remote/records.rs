//! Row shapes of the remote tables and their conversion into domain values.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{BudgetMonth, Expense, NewExpense, SavingsGoal};

use crate::backend::domain::models::{
    expense_from_parts, parse_amount, parse_expense_date, ExpenseValidationError,
};

pub const EXPENSES_TABLE: &str = "expenses";
pub const SAVINGS_GOALS_TABLE: &str = "savings_goals";

const GOAL_CATEGORY: &str = "monthly";
const GOAL_DESCRIPTION: &str = "Monthly savings goal";
const ACTIVE_STATUS: &str = "active";

/// Numeric columns may come back as JSON numbers or as strings
fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn id_as_text(value: &Value) -> Option<String> {
    value_as_text(value).filter(|id| !id.is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseRow {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub amount: Value,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: String,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = ExpenseValidationError;

    fn try_from(row: ExpenseRow) -> Result<Self, Self::Error> {
        let id = id_as_text(&row.id).ok_or(ExpenseValidationError::MissingId)?;
        let amount = value_as_text(&row.amount)
            .ok_or_else(|| ExpenseValidationError::InvalidAmount(row.amount.to_string()))?;
        expense_from_parts(id, &amount, &row.category, row.description, &row.date)
    }
}

/// Insert body for the `expenses` table
#[derive(Debug, Serialize)]
pub struct NewExpenseRow<'a> {
    pub user_id: &'a str,
    pub amount: Decimal,
    pub category: &'static str,
    pub description: &'a str,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl<'a> NewExpenseRow<'a> {
    pub fn new(user_id: &'a str, expense: &'a NewExpense) -> Self {
        NewExpenseRow {
            user_id,
            amount: expense.amount,
            category: expense.category.as_str(),
            description: expense.description.as_deref().unwrap_or(""),
            date: expense.date.format("%Y-%m-%d").to_string(),
            kind: "expense",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavingsGoalRow {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub target_amount: Value,
    #[serde(default)]
    pub target_date: Option<String>,
}

impl SavingsGoalRow {
    pub fn id(&self) -> Option<String> {
        id_as_text(&self.id)
    }

    /// The goal month comes from `target_date`, falling back to `today`'s month
    pub fn into_goal(self, today: NaiveDate) -> Result<SavingsGoal, ExpenseValidationError> {
        let amount = value_as_text(&self.target_amount)
            .ok_or_else(|| ExpenseValidationError::InvalidAmount(self.target_amount.to_string()))?;
        let month = match self.target_date.as_deref() {
            Some(raw) => BudgetMonth::from_date(parse_expense_date(raw)?),
            None => BudgetMonth::from_date(today),
        };
        Ok(SavingsGoal {
            amount: parse_amount(&amount)?,
            month,
        })
    }
}

/// Insert/update body for the `savings_goals` table
#[derive(Debug, Serialize)]
pub struct SavingsGoalPayload<'a> {
    pub user_id: &'a str,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub target_date: String,
    pub category: &'static str,
    pub description: &'static str,
    pub status: &'static str,
}

impl<'a> SavingsGoalPayload<'a> {
    pub fn new(user_id: &'a str, goal: &SavingsGoal) -> Self {
        SavingsGoalPayload {
            user_id,
            name: format!("Monthly Savings Goal - {}", goal.month),
            target_amount: goal.amount,
            current_amount: Decimal::ZERO,
            target_date: goal.month.first_day().format("%Y-%m-%d").to_string(),
            category: GOAL_CATEGORY,
            description: GOAL_DESCRIPTION,
            status: ACTIVE_STATUS,
        }
    }
}

pub fn active_status_filter() -> String {
    format!("eq.{}", ACTIVE_STATUS)
}
