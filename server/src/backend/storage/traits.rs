//! # Storage Traits
//!
//! This module defines the storage abstraction that lets the synchronizer
//! work against the hosted backend or the local snapshot interchangeably.

use async_trait::async_trait;
use shared::{Expense, NewExpense, SavingsGoal};

use crate::backend::domain::BudgetError;

/// Trait defining the interface for expense and goal storage operations
///
/// Every operation is scoped to an opaque user identifier supplied by the
/// external auth provider. Implementations must validate records they hand
/// back, so callers only ever see well-formed expenses.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// List all expenses for a user, newest first by date.
    /// Records failing validation are skipped with a warning.
    async fn list_expenses(&self, user_id: &str) -> Result<Vec<Expense>, BudgetError>;

    /// Persist a new expense; the store assigns its id
    async fn create_expense(&self, user_id: &str, expense: &NewExpense) -> Result<Expense, BudgetError>;

    /// Delete an expense by id
    async fn delete_expense(&self, user_id: &str, expense_id: &str) -> Result<(), BudgetError>;

    /// Get the user's active savings goal, whatever month it targets
    async fn get_active_goal(&self, user_id: &str) -> Result<Option<SavingsGoal>, BudgetError>;

    /// Create or overwrite the user's active goal. Calling it twice never
    /// leaves two active goals behind; the later call wins.
    async fn upsert_goal(&self, user_id: &str, goal: &SavingsGoal) -> Result<SavingsGoal, BudgetError>;
}
