use async_trait::async_trait;
use shared::{Expense, NewExpense, SavingsGoal};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::connection::LocalConnection;
use super::expense_repository::ExpenseRepository;
use super::goal_repository::GoalRepository;
use crate::backend::domain::BudgetError;
use crate::backend::storage::traits::ExpenseStore;

/// [`ExpenseStore`] over the per-user snapshot files
pub struct LocalSnapshotStore {
    expenses: ExpenseRepository,
    goals: GoalRepository,
    // Read-modify-write cycles must not interleave
    write_lock: Mutex<()>,
}

impl LocalSnapshotStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> anyhow::Result<Self> {
        let connection = LocalConnection::new(data_dir)?;
        info!("Local snapshot store at {}", connection.base_directory().display());
        Ok(Self {
            expenses: ExpenseRepository::new(connection.clone()),
            goals: GoalRepository::new(connection),
            write_lock: Mutex::new(()),
        })
    }
}

fn read_error(e: anyhow::Error) -> BudgetError {
    BudgetError::RemoteRead(e.to_string())
}

fn write_error(e: anyhow::Error) -> BudgetError {
    BudgetError::RemoteWrite(e.to_string())
}

#[async_trait]
impl ExpenseStore for LocalSnapshotStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn list_expenses(&self, user_id: &str) -> Result<Vec<Expense>, BudgetError> {
        let mut expenses = self.expenses.read_expenses(user_id).map_err(read_error)?;
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(expenses)
    }

    async fn create_expense(&self, user_id: &str, expense: &NewExpense) -> Result<Expense, BudgetError> {
        let _guard = self.write_lock.lock().await;
        let mut stored = self.expenses.read_stored(user_id).map_err(write_error)?;
        let created = expense.clone().into_expense(Uuid::new_v4().to_string());
        stored.push(&created);
        self.expenses.write_stored(user_id, &stored).map_err(write_error)?;
        debug!("Stored expense {} for {}", created.id, user_id);
        Ok(created)
    }

    async fn delete_expense(&self, user_id: &str, expense_id: &str) -> Result<(), BudgetError> {
        let _guard = self.write_lock.lock().await;
        let mut stored = self.expenses.read_stored(user_id).map_err(write_error)?;
        if !stored.remove(expense_id) {
            debug!("Expense {} not found for {}, nothing to delete", expense_id, user_id);
            return Ok(());
        }
        self.expenses.write_stored(user_id, &stored).map_err(write_error)
    }

    async fn get_active_goal(&self, user_id: &str) -> Result<Option<SavingsGoal>, BudgetError> {
        self.goals.read_goal(user_id).map_err(read_error)
    }

    async fn upsert_goal(&self, user_id: &str, goal: &SavingsGoal) -> Result<SavingsGoal, BudgetError> {
        let _guard = self.write_lock.lock().await;
        self.goals.write_goal(user_id, goal).map_err(write_error)?;
        Ok(goal.clone())
    }
}
