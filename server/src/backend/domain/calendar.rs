//! Calendar domain logic for the budget tracker.
//!
//! Builds the month grid shown by the calendar tab: padding cells up to the
//! first weekday, then one cell per day carrying that day's expenses and
//! total. The UI only handles presentation, while date arithmetic and
//! grouping happen here.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use shared::{BudgetMonth, CalendarDay, CalendarDayType, CalendarMonth, DayDetail, Expense};
use std::collections::HashMap;
use tracing::debug;

use super::models::ExpenseValidationError;

/// Calendar service that handles all calendar-related business logic
#[derive(Clone, Default)]
pub struct CalendarService;

impl CalendarService {
    /// Create a new CalendarService instance
    pub fn new() -> Self {
        Self
    }

    /// Generate a calendar month view from the given expenses
    pub fn generate_calendar_month(
        &self,
        month: u32,
        year: i32,
        expenses: &[Expense],
        today: NaiveDate,
    ) -> Result<CalendarMonth, ExpenseValidationError> {
        let budget_month = BudgetMonth::new(year, month)
            .map_err(|e| ExpenseValidationError::InvalidMonth(e.to_string()))?;
        let first_of_month = budget_month.first_day();
        let days_in_month = budget_month.days_in_month();
        // 0 = Sunday
        let first_day = first_of_month.weekday().num_days_from_sunday();

        debug!(
            "Generating calendar for {}: {} days, first weekday {}",
            budget_month, days_in_month, first_day
        );

        let mut expenses_by_day = self.group_expenses_by_day(budget_month, expenses);
        let mut calendar_days = Vec::with_capacity((first_day + days_in_month) as usize);

        for _ in 0..first_day {
            calendar_days.push(CalendarDay {
                day: 0,
                date: None,
                total: Decimal::ZERO,
                expenses: Vec::new(),
                day_type: CalendarDayType::PaddingBefore,
                has_expenses: false,
                is_today: false,
            });
        }

        let mut month_total = Decimal::ZERO;
        for (date, day) in first_of_month.iter_days().zip(1..=days_in_month) {
            let day_expenses = expenses_by_day.remove(&day).unwrap_or_default();
            let total: Decimal = day_expenses.iter().map(|e| e.amount).sum();
            month_total += total;

            calendar_days.push(CalendarDay {
                day,
                date: Some(date),
                total,
                has_expenses: total > Decimal::ZERO,
                expenses: day_expenses,
                day_type: CalendarDayType::MonthDay,
                is_today: date == today,
            });
        }

        Ok(CalendarMonth {
            month,
            year,
            month_name: first_of_month.format("%B").to_string(),
            first_day_of_week: first_day,
            days: calendar_days,
            total: month_total,
            previous: budget_month.previous(),
            next: budget_month.next(),
        })
    }

    /// Expenses and total for one selected day
    pub fn day_detail(&self, date: NaiveDate, expenses: &[Expense]) -> DayDetail {
        let day_expenses: Vec<Expense> = expenses.iter().filter(|e| e.date == date).cloned().collect();
        DayDetail {
            date,
            formatted_date: self.format_date_for_display(date),
            total: day_expenses.iter().map(|e| e.amount).sum(),
            expenses: day_expenses,
        }
    }

    /// Group the expenses falling in `month` by day of month
    fn group_expenses_by_day(&self, month: BudgetMonth, expenses: &[Expense]) -> HashMap<u32, Vec<Expense>> {
        let mut expenses_by_day: HashMap<u32, Vec<Expense>> = HashMap::new();
        for expense in expenses.iter().filter(|e| month.contains(e.date)) {
            expenses_by_day
                .entry(expense.date.day())
                .or_default()
                .push(expense.clone());
        }
        expenses_by_day
    }

    /// Format a date for the day detail header, e.g. "Tuesday, March 5, 2024"
    pub fn format_date_for_display(&self, date: NaiveDate) -> String {
        date.format("%A, %B %-d, %Y").to_string()
    }
}
