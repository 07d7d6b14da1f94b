//! Spending analytics over an in-memory list of expenses.
//!
//! Everything here is a pure function of its arguments. Relative filters take
//! `today` explicitly so results never depend on when a test happens to run.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use shared::{
    BudgetMonth, CategoryFilter, CategoryTotal, DailyTotal, Expense, ExpenseListQuery, ExpenseSort,
    GoalNudge, GoalProgress, NudgeKind, RecencyFilter, SavingsGoal,
};
use std::collections::BTreeMap;

use super::models::active_goal;

/// Number of most recent spending days shown in the daily trend
pub const DEFAULT_DAILY_WINDOW_DAYS: usize = 14;

pub fn total_spent(expenses: &[Expense]) -> Decimal {
    expenses.iter().map(|e| e.amount).sum()
}

/// Sum per category, in order of each category's first appearance.
/// Categories without expenses are left out.
pub fn category_totals(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for expense in expenses {
        match totals.iter_mut().find(|t| t.category == expense.category) {
            Some(total) => total.amount += expense.amount,
            None => totals.push(CategoryTotal {
                category: expense.category,
                amount: expense.amount,
                color: expense.category.color().to_string(),
            }),
        }
    }
    totals
}

/// Sum per date in ascending order, keeping only the last `window_days` dates
pub fn daily_totals(expenses: &[Expense], window_days: usize) -> Vec<DailyTotal> {
    let mut by_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for expense in expenses {
        *by_date.entry(expense.date).or_insert(Decimal::ZERO) += expense.amount;
    }

    let skip = by_date.len().saturating_sub(window_days);
    by_date
        .into_iter()
        .skip(skip)
        .map(|(date, amount)| DailyTotal { date, amount })
        .collect()
}

/// Expenses in the same calendar month as `reference`
pub fn month_filter(expenses: &[Expense], reference: NaiveDate) -> Vec<Expense> {
    let month = BudgetMonth::from_date(reference);
    expenses.iter().filter(|e| month.contains(e.date)).cloned().collect()
}

/// Progress for the goal of the month containing `today`.
///
/// Returns None when there is no goal, or the stored goal belongs to another
/// month; the caller shows that as "no goal set".
pub fn goal_progress(
    goal: Option<&SavingsGoal>,
    total_spent: Decimal,
    today: NaiveDate,
) -> Option<GoalProgress> {
    let goal = active_goal(goal, today)?;
    if goal.amount <= Decimal::ZERO {
        return None;
    }

    let hundred = Decimal::ONE_HUNDRED;
    let saved = (goal.amount - total_spent).max(Decimal::ZERO);
    let progress_percent = (saved / goal.amount * hundred).min(hundred);
    let budget_used_percent = (total_spent / goal.amount * hundred).clamp(Decimal::ZERO, hundred);

    Some(GoalProgress {
        saved,
        progress_percent,
        budget_used_percent,
        over_budget: total_spent > goal.amount,
    })
}

pub fn goal_nudge(progress: Option<&GoalProgress>) -> Option<GoalNudge> {
    let progress = progress?;
    let (message, kind) = if progress.over_budget {
        (
            "You've exceeded your spending limit! Consider a no-spend day tomorrow.",
            NudgeKind::Warning,
        )
    } else if progress.progress_percent >= Decimal::from(75) {
        ("Amazing! You're almost reaching your savings goal!", NudgeKind::Success)
    } else if progress.progress_percent >= Decimal::from(50) {
        ("Great progress! You're halfway to your savings goal!", NudgeKind::Info)
    } else if progress.progress_percent >= Decimal::from(25) {
        ("Good start! Keep tracking your expenses to reach your goal.", NudgeKind::Info)
    } else {
        ("Start strong! Every dollar saved brings you closer to your goal.", NudgeKind::Info)
    };

    Some(GoalNudge {
        message: message.to_string(),
        kind,
    })
}

/// Stable sort; ties keep their incoming order
pub fn sort_expenses(mut expenses: Vec<Expense>, key: ExpenseSort) -> Vec<Expense> {
    match key {
        ExpenseSort::NewestFirst => expenses.sort_by(|a, b| b.date.cmp(&a.date)),
        ExpenseSort::HighestAmount => expenses.sort_by(|a, b| b.amount.cmp(&a.amount)),
    }
    expenses
}

pub fn filter_by_category(expenses: Vec<Expense>, filter: CategoryFilter) -> Vec<Expense> {
    match filter {
        CategoryFilter::All => expenses,
        CategoryFilter::Only(category) => expenses.into_iter().filter(|e| e.category == category).collect(),
    }
}

/// `LastWeek` keeps dates from seven days before `today` onwards
pub fn filter_by_recency(expenses: Vec<Expense>, filter: RecencyFilter, today: NaiveDate) -> Vec<Expense> {
    match filter {
        RecencyFilter::All => expenses,
        RecencyFilter::LastWeek => {
            let cutoff = today - Duration::days(7);
            expenses.into_iter().filter(|e| e.date >= cutoff).collect()
        }
        RecencyFilter::ThisMonth => month_filter(&expenses, today),
    }
}

/// Apply the expense history filters (AND-combined) and the chosen sort
pub fn apply_list_query(expenses: &[Expense], query: &ExpenseListQuery, today: NaiveDate) -> Vec<Expense> {
    let filtered = filter_by_category(expenses.to_vec(), query.category.unwrap_or_default());
    let filtered = filter_by_recency(filtered, query.recency.unwrap_or_default(), today);
    sort_expenses(filtered, query.sort.unwrap_or_default())
}
