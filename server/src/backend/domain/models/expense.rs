//! Structural validation for expense records.
//!
//! Every adapter that turns raw data (form input, CSV rows, remote rows) into
//! an [`Expense`] goes through these functions, so the aggregation code can
//! rely on positive amounts, known categories and real calendar dates.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{Expense, ExpenseCategory, NewExpense};
use std::str::FromStr;

pub const MAX_DESCRIPTION_LENGTH: usize = 256;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpenseValidationError {
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("Amount is not a valid number: '{0}'")]
    InvalidAmount(String),
    #[error("Unknown expense category: '{0}'")]
    UnknownCategory(String),
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Invalid month: {0}")]
    InvalidMonth(String),
    #[error("Description is too long ({0} characters, max 256)")]
    DescriptionTooLong(usize),
    #[error("Record has no id")]
    MissingId,
}

pub fn validate_amount(amount: Decimal) -> Result<Decimal, ExpenseValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ExpenseValidationError::NonPositiveAmount(amount));
    }
    Ok(amount)
}

/// Parse a textual amount (as stored by CSV files or numeric database columns)
pub fn parse_amount(raw: &str) -> Result<Decimal, ExpenseValidationError> {
    let trimmed = raw.trim();
    let amount = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| ExpenseValidationError::InvalidAmount(raw.to_string()))?;
    validate_amount(amount)
}

pub fn parse_category(raw: &str) -> Result<ExpenseCategory, ExpenseValidationError> {
    ExpenseCategory::from_str(raw).map_err(|_| ExpenseValidationError::UnknownCategory(raw.to_string()))
}

/// Parse a `YYYY-MM-DD` date, ignoring any `T...` time suffix
pub fn parse_expense_date(raw: &str) -> Result<NaiveDate, ExpenseValidationError> {
    let date_part = raw.trim().split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| ExpenseValidationError::InvalidDate(raw.to_string()))
}

/// Trim the description; blank descriptions become None
pub fn normalize_description(
    description: Option<String>,
) -> Result<Option<String>, ExpenseValidationError> {
    let Some(description) = description else {
        return Ok(None);
    };
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let length = trimmed.chars().count();
    if length > MAX_DESCRIPTION_LENGTH {
        return Err(ExpenseValidationError::DescriptionTooLong(length));
    }
    Ok(Some(trimmed.to_string()))
}

/// Validate user input before it is sent to a store
pub fn validate_new_expense(expense: NewExpense) -> Result<NewExpense, ExpenseValidationError> {
    Ok(NewExpense {
        amount: validate_amount(expense.amount)?,
        category: expense.category,
        description: normalize_description(expense.description)?,
        date: expense.date,
    })
}

/// Validate a record handed back by a store
pub fn validate_expense(expense: Expense) -> Result<Expense, ExpenseValidationError> {
    Ok(Expense {
        amount: validate_amount(expense.amount)?,
        description: normalize_description(expense.description)?,
        ..expense
    })
}

/// Build an expense from the loosely typed fields a store hands back
pub fn expense_from_parts(
    id: String,
    amount: &str,
    category: &str,
    description: Option<String>,
    date: &str,
) -> Result<Expense, ExpenseValidationError> {
    Ok(Expense {
        id,
        amount: parse_amount(amount)?,
        category: parse_category(category)?,
        description: normalize_description(description)?,
        date: parse_expense_date(date)?,
    })
}
